//! Per-call run options

use std::collections::HashMap;

use crate::serialization::{DynValue, Dynamic};

/// Options passed with every `run`/`resume` call
///
/// Workflows hand their options to sub-agents unchanged.
#[derive(Debug, Clone, Default)]
pub struct AgentRunOptions {
    /// Where the runner persists the interrupt of this run
    pub checkpoint_id: Option<String>,

    /// Values seeded into the run session before the run starts
    pub session_values: HashMap<String, Dynamic>,
}

impl AgentRunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checkpoint_id(mut self, id: impl Into<String>) -> Self {
        self.checkpoint_id = Some(id.into());
        self
    }

    pub fn with_session_value(mut self, key: impl Into<String>, value: impl DynValue) -> Self {
        self.session_values.insert(key.into(), Dynamic::new(value));
        self
    }

    pub fn with_session_values(mut self, values: HashMap<String, Dynamic>) -> Self {
        self.session_values.extend(values);
        self
    }
}
