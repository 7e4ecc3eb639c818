//! Workflow state types

use serde::{Deserialize, Serialize};

/// Lifecycle state of one workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowState {
    /// Producer is driving sub-agents
    Running,

    /// Every sub-agent finished cleanly
    Completed,

    /// A sub-agent requested the pipeline to stop
    Exited,

    /// A loop was stopped by a break-loop action
    LoopBroken,

    /// A sub-agent suspended; a resume coordinate was emitted
    Interrupted,

    /// A sub-agent or the workflow itself failed
    Failed {
        /// Error message
        message: String,
    },
}

impl WorkflowState {
    /// Create a failed state
    pub fn failed(msg: impl Into<String>) -> Self {
        WorkflowState::Failed {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Running => write!(f, "Running"),
            WorkflowState::Completed => write!(f, "Completed"),
            WorkflowState::Exited => write!(f, "Exited"),
            WorkflowState::LoopBroken => write!(f, "Loop broken"),
            WorkflowState::Interrupted => write!(f, "Interrupted"),
            WorkflowState::Failed { message } => write!(f, "Failed: {}", message),
        }
    }
}
