//! In-memory checkpoint store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::CheckPointStore;
use crate::core::FrameworkResult;

/// Keeps checkpoints in a map; contents are lost with the process
#[derive(Debug, Default)]
pub struct InMemoryCheckPointStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryCheckPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CheckPointStore for InMemoryCheckPointStore {
    async fn get(&self, id: &str) -> FrameworkResult<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn set(&self, id: &str, data: Vec<u8>) -> FrameworkResult<()> {
        self.entries.write().await.insert(id.to_string(), data);
        Ok(())
    }
}
