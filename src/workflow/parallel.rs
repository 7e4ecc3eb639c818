//! Parallel mode
//!
//! Every sub-agent runs on its own producer; their streams are merged as
//! events arrive. An interrupted branch stops being read and its
//! coordinate is kept by branch index until the others have drained; any
//! output on the interrupting event is still relayed, without the action.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, BoxStream, SelectAll};
use futures::StreamExt;

use super::agent::{error_message, WorkflowInner};
use crate::agent::{AgentRunOptions, InterruptInfo, WorkflowInterruptInfo};
use crate::core::{AgentAction, AgentContext, AgentEvent, AgentInput, FrameworkResult, WorkflowState};
use crate::runtime::invocation::{start_resume, start_run, ChildRun};
use crate::runtime::EventSender;

type Branch = BoxStream<'static, (usize, AgentEvent)>;

impl WorkflowInner {
    pub(super) async fn run_parallel(
        &self,
        ctx: &AgentContext,
        tx: &EventSender,
        input: &Arc<AgentInput>,
        resume: Option<&WorkflowInterruptInfo>,
        options: &AgentRunOptions,
    ) -> FrameworkResult<WorkflowState> {
        let mut branches: Vec<Branch> = Vec::with_capacity(self.sub_agents.len());
        for (index, agent) in self.sub_agents.iter().enumerate() {
            let child = match resume {
                None => start_run(ctx, agent, input, options),
                Some(info) => match info.parallel_interrupt_info.get(&index) {
                    Some(branch_info) => {
                        start_resume(ctx, agent, input, Some(branch_info.clone()), options)?
                    }
                    None => continue,
                },
            };
            branches.push(branch_stream(index, child));
        }

        let mut merged: SelectAll<Branch> = stream::select_all(branches);
        let mut interrupts: BTreeMap<usize, InterruptInfo> = BTreeMap::new();

        while let Some((index, event)) = merged.next().await {
            if event.is_error() {
                // Dropping the merge stops reading the remaining branches
                let message = error_message(&event);
                tx.send(event).await?;
                return Ok(WorkflowState::failed(message));
            }
            if let Some(info) = event.interrupt_info() {
                tracing::debug!(agent = %self.name(), branch = index, "Parallel branch interrupted");
                interrupts.insert(index, info.clone());
                if event.output.is_some() {
                    // The aggregated interrupt replaces the branch's own action
                    tx.send(AgentEvent { action: None, ..event }).await?;
                }
                continue;
            }
            tx.send(event).await?;
        }

        if interrupts.is_empty() {
            return Ok(WorkflowState::Completed);
        }

        let coordinate = WorkflowInterruptInfo::parallel(input.clone(), interrupts);
        let event = self.own_event(
            ctx,
            AgentEvent::action(
                self.name(),
                AgentAction::interrupted(InterruptInfo::workflow(coordinate)),
            ),
        );
        ctx.replace_interrupt_run_ctx();
        tx.send(event).await?;
        Ok(WorkflowState::Interrupted)
    }
}

/// Events of one branch tagged with its index; ends after an interrupt
fn branch_stream(index: usize, child: ChildRun) -> Branch {
    stream::unfold(Some(child), move |state| async move {
        let mut child = state?;
        let event = child.next().await?;
        let next = if event.is_interrupted() { None } else { Some(child) };
        Some(((index, event), next))
    })
    .boxed()
}
