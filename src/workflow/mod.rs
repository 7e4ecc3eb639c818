//! Workflow agents
//!
//! Compose sub-agents into sequential, parallel or loop pipelines. Any
//! sub-agent may interrupt; the workflow then emits a resume coordinate
//! and can later continue from exactly that point.

pub mod agent;
pub mod config;
mod loop_mode;
mod parallel;
mod sequential;


pub use agent::WorkflowAgent;
pub use config::{WorkflowConfig, WorkflowMode};
