//! Core types for the workflow runtime
//!
//! This module provides the fundamental types used throughout the crate:
//! - `AgentContext` - Ambient state passed to every agent call
//! - `AgentEvent` / `AgentAction` - What agents stream back
//! - `AgentInput` / `Message` - What agents are invoked with
//! - `WorkflowState` - Lifecycle of one workflow run
//! - `FrameworkError` - Error types

pub mod context;
pub mod error;
pub mod event;
pub mod message;
pub mod state;

pub use context::AgentContext;
pub use error::{FrameworkError, FrameworkResult};
pub use event::{AgentAction, AgentEvent, AgentOutput, BreakLoopAction};
pub use message::{AgentInput, Message, Role};
pub use state::WorkflowState;
