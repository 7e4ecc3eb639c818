//! Sub-agent invocation
//!
//! Starts a child agent under a derived run context and relays its
//! events: each event is stamped with the child's path and name when it
//! carries none, recorded in the session when it belongs to the child
//! itself, and interrupts are noted as pending.

use std::sync::Arc;

use super::channels::AgentEventStream;
use crate::agent::{AgentRunOptions, ArcAgent, InterruptInfo, ResumeInfo};
use crate::core::{AgentContext, AgentEvent, AgentInput, FrameworkError, FrameworkResult};
use crate::session::{PendingInterrupt, RunContext};

/// A running child agent
pub struct ChildRun {
    agent_name: String,
    run_ctx: RunContext,
    stream: AgentEventStream,
}

impl ChildRun {
    pub fn run_ctx(&self) -> &RunContext {
        &self.run_ctx
    }

    /// Next event of the child; `None` once it has finished
    pub async fn next(&mut self) -> Option<AgentEvent> {
        let event = self.stream.next().await?;
        Some(record_event(&self.run_ctx, &self.agent_name, event))
    }
}

/// Stamp an event with its origin and record it in the session
pub fn record_event(run_ctx: &RunContext, agent_name: &str, mut event: AgentEvent) -> AgentEvent {
    if event.run_path.is_empty() {
        event.run_path = run_ctx.run_path().to_vec();
    }
    if event.agent_name.is_empty() {
        event.agent_name = agent_name.to_string();
    }

    if event.run_path.as_slice() == run_ctx.run_path() {
        run_ctx.session().add_event(event.clone());
    }
    if event.is_interrupted() {
        run_ctx.session().append_interrupt_run_ctx(PendingInterrupt {
            run_path: event.run_path.clone(),
            root_input: run_ctx.root_input().cloned(),
        });
    }
    event
}

/// Whether the root input of this run asked for streaming
pub fn streaming_enabled(run_ctx: &RunContext) -> bool {
    run_ctx
        .root_input()
        .map_or(false, |input| input.enable_streaming)
}

/// Invoke `agent.run` as a child of `ctx`
pub fn start_run(
    ctx: &AgentContext,
    agent: &ArcAgent,
    input: &Arc<AgentInput>,
    options: &AgentRunOptions,
) -> ChildRun {
    let (child_ctx, run_ctx) = ctx.init_run_ctx(agent.name(), input);
    tracing::debug!(agent = %agent.name(), run_path = %run_ctx.path_string(), "Running sub-agent");

    ChildRun {
        agent_name: agent.name().to_string(),
        stream: agent.run(child_ctx, input.clone(), options.clone()),
        run_ctx,
    }
}

/// Invoke `agent.resume` as a child of `ctx`
///
/// Fails when `info` is missing or the agent cannot be resumed.
pub fn start_resume(
    ctx: &AgentContext,
    agent: &ArcAgent,
    input: &Arc<AgentInput>,
    info: Option<InterruptInfo>,
    options: &AgentRunOptions,
) -> FrameworkResult<ChildRun> {
    let info = info.ok_or_else(|| FrameworkError::MissingInterruptInfo(agent.name().to_string()))?;
    let resumable = agent
        .as_resumable()
        .ok_or_else(|| FrameworkError::NotResumable(agent.name().to_string()))?;

    let (child_ctx, run_ctx) = ctx.init_run_ctx(agent.name(), input);
    tracing::debug!(agent = %agent.name(), run_path = %run_ctx.path_string(), "Resuming sub-agent");

    let resume_info = ResumeInfo::new(info).with_streaming(streaming_enabled(&run_ctx));
    Ok(ChildRun {
        agent_name: agent.name().to_string(),
        stream: resumable.resume(child_ctx, resume_info, options.clone()),
        run_ctx,
    })
}
