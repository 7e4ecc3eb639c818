//! Agent abstractions
//!
//! - `Agent` / `ResumableAgent` - What workflows orchestrate
//! - `InterruptInfo` / `ResumeInfo` - Suspend and continue payloads
//! - `AgentRunOptions` - Per-call options

pub mod interrupt;
pub mod options;
pub mod traits;

pub use interrupt::{InterruptData, InterruptInfo, ResumeInfo, WorkflowInterruptInfo};
pub use options::AgentRunOptions;
pub use traits::{Agent, ArcAgent, ResumableAgent};
