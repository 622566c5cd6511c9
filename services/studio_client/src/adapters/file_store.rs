//! services/studio_client/src/adapters/file_store.rs
//!
//! The durable storage scope. Each key is one file inside the state directory,
//! so values survive process restarts.
//! It implements the `StorageScope` port from the `core` crate.

use async_trait::async_trait;
use avatar_studio_core::ports::{PortError, PortResult, StorageScope};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A `StorageScope` backed by one file per key.
#[derive(Debug, Clone)]
pub struct FileScope {
    dir: PathBuf,
}

impl FileScope {
    /// Creates a new `FileScope`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::Unexpected(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(key))
    }
}

//=========================================================================================
// `StorageScope` Trait Implementation
//=========================================================================================

#[async_trait]
impl StorageScope for FileScope {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)?).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;
        fs::write(path, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        match fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Io(e)),
        }
    }
}
