//! Sequential pass
//!
//! Runs sub-agents in order, relaying their events. A sub-agent's action
//! event is held back until its next event arrives, so only the action on
//! its last event can stop the pass.

use std::sync::Arc;

use super::agent::{error_message, WorkflowInner};
use crate::agent::{AgentRunOptions, InterruptInfo, WorkflowInterruptInfo};
use crate::core::{AgentAction, AgentContext, AgentEvent, AgentInput, FrameworkResult, WorkflowState};
use crate::runtime::invocation::{start_resume, start_run};
use crate::runtime::EventSender;

impl WorkflowInner {
    /// Run one pass over the sub-agents
    ///
    /// `loop_iterations` is set when the pass belongs to a loop; it is
    /// recorded in interrupt coordinates and enables break-loop handling.
    pub(super) async fn sequential_pass(
        &self,
        ctx: &AgentContext,
        tx: &EventSender,
        input: &Arc<AgentInput>,
        resume: Option<&WorkflowInterruptInfo>,
        options: &AgentRunOptions,
        loop_iterations: Option<usize>,
    ) -> FrameworkResult<WorkflowState> {
        let start = resume.map_or(0, |info| info.sequential_interrupt_index);
        let mut nested = resume.and_then(|info| info.sequential_interrupt_info.as_deref().cloned());

        for (index, agent) in self.sub_agents.iter().enumerate().skip(start) {
            let mut child = if resume.is_some() && index == start {
                start_resume(ctx, agent, input, nested.take(), options)?
            } else {
                start_run(ctx, agent, input, options)
            };

            let mut held: Option<AgentEvent> = None;
            while let Some(event) = child.next().await {
                if let Some(prev) = held.take() {
                    tx.send(prev).await?;
                }
                if event.is_error() {
                    let message = error_message(&event);
                    tx.send(event).await?;
                    return Ok(WorkflowState::failed(message));
                }
                if event.action.is_some() {
                    held = Some(event);
                } else {
                    tx.send(event).await?;
                }
            }

            let Some(mut last) = held else {
                continue;
            };
            match last.action.take() {
                Some(AgentAction::Interrupted(info)) => {
                    let coordinate = WorkflowInterruptInfo::sequential(
                        input.clone(),
                        index,
                        info,
                        loop_iterations.unwrap_or(0),
                    );
                    last.action = Some(AgentAction::interrupted(InterruptInfo::workflow(coordinate)));
                    let event = self.own_event(ctx, last);

                    tracing::debug!(agent = %self.name(), index, sub_agent = %agent.name(), "Sequential pass interrupted");
                    ctx.replace_interrupt_run_ctx();
                    tx.send(event).await?;
                    return Ok(WorkflowState::Interrupted);
                }
                Some(AgentAction::Exit) => {
                    last.action = Some(AgentAction::Exit);
                    tx.send(last).await?;
                    return Ok(WorkflowState::Exited);
                }
                Some(AgentAction::BreakLoop(mut brk)) if !brk.done && loop_iterations.is_some() => {
                    brk.done = true;
                    brk.current_iterations = loop_iterations.unwrap_or(0);
                    last.action = Some(AgentAction::BreakLoop(brk));
                    tx.send(last).await?;
                    return Ok(WorkflowState::LoopBroken);
                }
                action => {
                    last.action = action;
                    tx.send(last).await?;
                }
            }
        }

        Ok(WorkflowState::Completed)
    }
}
