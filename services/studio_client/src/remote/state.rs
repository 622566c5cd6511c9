//! services/studio_client/src/remote/state.rs
//!
//! Defines the state shared by every backend-facing component.

use crate::adapters::{FileScope, MemoryScope};
use crate::config::Config;
use crate::error::ClientError;
use avatar_studio_core::ports::StorageScope;
use avatar_studio_core::{SessionStore, TimeNormalizer};
use std::sync::Arc;

//=========================================================================================
// ClientState (Shared Across All Components)
//=========================================================================================

/// The shared client state, created once at startup and handed to the gateway,
/// the job synchroniser and the submission helpers.
#[derive(Clone)]
pub struct ClientState {
    pub http: reqwest::Client,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub clock: TimeNormalizer,
}

impl ClientState {
    /// Builds the state with explicit storage scopes.
    pub fn new(
        config: Arc<Config>,
        durable: Arc<dyn StorageScope>,
        volatile: Arc<dyn StorageScope>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            clock: TimeNormalizer::new(config.display_offset),
            sessions: SessionStore::new(durable, volatile),
            config,
        })
    }

    /// The token on disk under the configured state directory, the user record in memory.
    pub fn with_default_storage(config: Arc<Config>) -> Result<Self, ClientError> {
        let durable = Arc::new(FileScope::new(config.state_dir.clone()));
        let volatile = Arc::new(MemoryScope::new());
        Self::new(config, durable, volatile)
    }

    pub fn endpoint(&self, path: &str) -> String {
        self.config.endpoint(path)
    }
}
