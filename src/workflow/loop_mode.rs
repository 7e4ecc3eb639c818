//! Loop mode: sequential passes up to `max_iterations`

use std::sync::Arc;

use super::agent::WorkflowInner;
use crate::agent::{AgentRunOptions, WorkflowInterruptInfo};
use crate::core::{AgentContext, AgentInput, FrameworkResult, WorkflowState};
use crate::runtime::EventSender;

impl WorkflowInner {
    pub(super) async fn run_loop(
        &self,
        ctx: &AgentContext,
        tx: &EventSender,
        input: &Arc<AgentInput>,
        resume: Option<&WorkflowInterruptInfo>,
        options: &AgentRunOptions,
    ) -> FrameworkResult<WorkflowState> {
        let max_iterations = self.config.max_iterations;
        let mut iterations = resume.map_or(0, |info| info.loop_iterations);
        // Only the first pass resumes
        let mut resume = resume;

        while iterations < max_iterations {
            let state = self
                .sequential_pass(ctx, tx, input, resume.take(), options, Some(iterations))
                .await?;
            if state != WorkflowState::Completed {
                return Ok(state);
            }
            iterations += 1;
            tracing::debug!(agent = %self.name(), iterations, max_iterations, "Loop pass completed");
        }

        Ok(WorkflowState::Completed)
    }
}
