//! Checkpoint records and the storage trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::InterruptInfo;
use crate::core::FrameworkResult;
use crate::serialization::GenericSerializer;
use crate::session::{RunContext, RunContextSnapshot};

/// Byte storage for checkpoints, keyed by checkpoint id
#[async_trait]
pub trait CheckPointStore: Send + Sync {
    /// Load the bytes stored under `id`, if any
    async fn get(&self, id: &str) -> FrameworkResult<Option<Vec<u8>>>;

    /// Store `data` under `id`, replacing what was there
    async fn set(&self, id: &str, data: Vec<u8>) -> FrameworkResult<()>;
}

/// Everything needed to resume an interrupted run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Root run context at the time of the interrupt
    pub run_ctx: RunContextSnapshot,

    /// Interrupt raised by the root agent
    pub info: InterruptInfo,

    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(run_ctx: &RunContext, info: InterruptInfo) -> Self {
        Self {
            run_ctx: run_ctx.snapshot(),
            info,
            saved_at: Utc::now(),
        }
    }

    /// Encode and store this checkpoint under `id`
    pub async fn save(
        &self,
        store: &dyn CheckPointStore,
        serializer: &GenericSerializer,
        id: &str,
    ) -> FrameworkResult<()> {
        let data = serializer.marshal(self)?;
        store.set(id, data).await?;
        tracing::debug!(checkpoint_id = %id, "Checkpoint saved");
        Ok(())
    }

    /// Load and decode the checkpoint stored under `id`
    pub async fn load(
        store: &dyn CheckPointStore,
        serializer: &GenericSerializer,
        id: &str,
    ) -> FrameworkResult<Option<Self>> {
        match store.get(id).await? {
            Some(data) => Ok(Some(serializer.unmarshal(&data)?)),
            None => Ok(None),
        }
    }
}
