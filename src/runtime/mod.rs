//! Agent runtime and communication
//!
//! This module provides the infrastructure for running agents:
//! - `AgentEventStream` / `EventSender` - The event pipe every call returns
//! - `spawn_producer` - Runs an agent body on its own task behind a panic boundary
//! - `invocation` - Starts sub-agents under derived run contexts
//! - `Runner` - Drives a root agent and persists checkpoints
//!
//! Agents run as separate tokio tasks and communicate via channels.

pub mod channels;
pub mod invocation;
pub mod producer;
pub mod runner;

pub use channels::{
    event_pipe, event_pipe_with_capacity, AgentEventStream, EventSender, EVENT_PIPE_SIZE,
};
pub use producer::spawn_producer;
pub use runner::Runner;
