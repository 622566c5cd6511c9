//! services/studio_client/src/error.rs
//!
//! Defines the primary error type for the studio client.

use crate::config::ConfigError;
use avatar_studio_core::ports::PortError;

/// The primary error type for the `studio_client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from a storage port.
    #[error("Storage error: {0}")]
    Port(#[from] PortError),

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    /// An operation needing credentials was attempted without them.
    #[error("Authentication required: {0}")]
    Auth(String),

    /// A success response whose body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Caller input rejected before anything was sent.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Represents a standard Input/Output error (e.g., reading an upload from disk).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else if e.is_timeout() {
            ClientError::Network("request timed out".to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}
