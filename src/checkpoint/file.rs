//! File-backed checkpoint store
//!
//! Each checkpoint is one file named after its id inside a base
//! directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::store::CheckPointStore;
use crate::core::{FrameworkError, FrameworkResult};

/// Default directory for checkpoint storage
const CHECKPOINTS_DIR: &str = "checkpoints";

/// Stores checkpoints as files under a directory
#[derive(Debug, Clone)]
pub struct FileCheckPointStore {
    base_dir: PathBuf,
}

impl FileCheckPointStore {
    /// Create a store in the default directory
    pub fn new() -> Self {
        Self::with_dir(CHECKPOINTS_DIR)
    }

    /// Create a store in a custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
        }
    }

    /// Get the file path for a checkpoint
    ///
    /// Ids that could escape the base directory are rejected.
    pub fn checkpoint_path(&self, id: &str) -> FrameworkResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(FrameworkError::Store(format!("invalid checkpoint id: {:?}", id)));
        }
        Ok(self.base_dir.join(id))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Default for FileCheckPointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckPointStore for FileCheckPointStore {
    async fn get(&self, id: &str) -> FrameworkResult<Option<Vec<u8>>> {
        let path = self.checkpoint_path(id)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, id: &str, data: Vec<u8>) -> FrameworkResult<()> {
        let path = self.checkpoint_path(id)?;
        fs::create_dir_all(&self.base_dir).await?;
        fs::write(&path, data).await?;
        tracing::debug!(path = %path.display(), "Wrote checkpoint file");
        Ok(())
    }
}
