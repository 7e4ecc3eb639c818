//! Agent traits
//!
//! Every participant in a workflow implements [`Agent`]. Calls return
//! immediately with an [`AgentEventStream`]; the work happens on a
//! producer task feeding that stream.

use std::sync::Arc;

use super::interrupt::ResumeInfo;
use super::options::AgentRunOptions;
use crate::core::{AgentContext, AgentInput};
use crate::runtime::AgentEventStream;

/// An agent that can be invoked with an input
pub trait Agent: Send + Sync {
    /// Name of this agent, used as its run path step
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Start a run and stream its events
    fn run(
        &self,
        ctx: AgentContext,
        input: Arc<AgentInput>,
        options: AgentRunOptions,
    ) -> AgentEventStream;

    /// View this agent as resumable, if it supports resume
    fn as_resumable(&self) -> Option<&dyn ResumableAgent> {
        None
    }
}

/// An agent able to continue from an interrupt it raised
pub trait ResumableAgent: Agent {
    fn resume(
        &self,
        ctx: AgentContext,
        info: ResumeInfo,
        options: AgentRunOptions,
    ) -> AgentEventStream;
}

/// Shared handle to an agent
pub type ArcAgent = Arc<dyn Agent>;
