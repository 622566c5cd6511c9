//! crates/avatar_studio_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! Storage is injected through these traits so the session logic works against
//! any medium and can be replaced with an in-memory double in tests.

use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the underlying medium (filesystem, memory).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// One key/value persistence scope.
///
/// Scopes differ only in lifetime: a durable scope survives restarts, a volatile
/// one is gone when the process ends.
#[async_trait]
pub trait StorageScope: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removes the key. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> PortResult<()>;
}
