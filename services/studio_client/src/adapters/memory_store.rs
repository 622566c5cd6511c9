//! services/studio_client/src/adapters/memory_store.rs
//!
//! The volatile storage scope: an in-process map that is gone when the process exits.
//! It implements the `StorageScope` port from the `core` crate.

use async_trait::async_trait;
use avatar_studio_core::ports::{PortError, PortResult, StorageScope};
use std::collections::HashMap;
use std::sync::Mutex;

/// A `StorageScope` that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryScope {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> PortError {
        PortError::Unexpected("memory scope lock poisoned".to_string())
    }
}

#[async_trait]
impl StorageScope for MemoryScope {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}
