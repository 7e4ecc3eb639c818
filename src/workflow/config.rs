//! Workflow configuration
//!
//! Configuration for a [`WorkflowAgent`](super::WorkflowAgent). Sub-agents
//! are attached when the agent is built; everything else can come from a
//! config file.
//!
//! ```ignore
//! let config = WorkflowConfig::looping("review", "Draft until approved", 5)
//!     .with_description("Draft, review, repeat");
//! let agent = WorkflowAgent::new(config, vec![writer, reviewer])?;
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{FrameworkError, FrameworkResult};

/// Control flow of a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowMode {
    /// Sub-agents run one after the other
    Sequential,

    /// Sub-agents run concurrently
    Parallel,

    /// Sequential passes, repeated up to `max_iterations`
    Loop,

    /// Anything else found in a config file
    Unknown(String),
}

impl From<String> for WorkflowMode {
    fn from(mode: String) -> Self {
        match mode.as_str() {
            "sequential" => WorkflowMode::Sequential,
            "parallel" => WorkflowMode::Parallel,
            "loop" => WorkflowMode::Loop,
            _ => WorkflowMode::Unknown(mode),
        }
    }
}

impl From<WorkflowMode> for String {
    fn from(mode: WorkflowMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowMode::Sequential => write!(f, "sequential"),
            WorkflowMode::Parallel => write!(f, "parallel"),
            WorkflowMode::Loop => write!(f, "loop"),
            WorkflowMode::Unknown(mode) => write!(f, "{}", mode),
        }
    }
}

/// Configuration for a workflow agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Agent name, also its run path step
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub mode: WorkflowMode,

    /// Upper bound on loop passes (loop mode only, must be > 0)
    #[serde(default)]
    pub max_iterations: usize,
}

impl WorkflowConfig {
    fn new(name: impl Into<String>, description: impl Into<String>, mode: WorkflowMode) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            mode,
            max_iterations: 0,
        }
    }

    /// Configuration of a sequential workflow
    pub fn sequential(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, WorkflowMode::Sequential)
    }

    /// Configuration of a parallel workflow
    pub fn parallel(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, WorkflowMode::Parallel)
    }

    /// Configuration of a loop workflow
    pub fn looping(
        name: impl Into<String>,
        description: impl Into<String>,
        max_iterations: usize,
    ) -> Self {
        Self::new(name, description, WorkflowMode::Loop).with_max_iterations(max_iterations)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> FrameworkResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the configuration can be built into an agent
    ///
    /// An unknown mode passes; it is reported when the agent runs.
    pub fn validate(&self) -> FrameworkResult<()> {
        if self.name.trim().is_empty() {
            return Err(FrameworkError::InvalidConfig(
                "workflow name must not be empty".into(),
            ));
        }
        if self.mode == WorkflowMode::Loop && self.max_iterations == 0 {
            return Err(FrameworkError::InvalidConfig(format!(
                "loop workflow `{}` needs max_iterations > 0",
                self.name
            )));
        }
        Ok(())
    }
}
