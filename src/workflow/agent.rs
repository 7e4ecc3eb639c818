//! Workflow agent
//!
//! A `WorkflowAgent` is itself an [`Agent`]: it can be nested inside other
//! workflows and resumed after any of its sub-agents interrupts.

use std::any::type_name;
use std::sync::Arc;

use super::config::{WorkflowConfig, WorkflowMode};
use crate::agent::{
    Agent, AgentRunOptions, ArcAgent, InterruptData, ResumableAgent, ResumeInfo,
    WorkflowInterruptInfo,
};
use crate::core::{
    AgentContext, AgentEvent, AgentInput, FrameworkError, FrameworkResult, WorkflowState,
};
use crate::runtime::{spawn_producer, AgentEventStream, EventSender};

/// Orchestrates sub-agents sequentially, in parallel or in a loop
#[derive(Clone)]
pub struct WorkflowAgent {
    inner: Arc<WorkflowInner>,
}

pub(super) struct WorkflowInner {
    pub config: WorkflowConfig,
    pub sub_agents: Vec<ArcAgent>,
}

impl WorkflowAgent {
    /// Build a workflow from a validated configuration
    pub fn new(config: WorkflowConfig, sub_agents: Vec<ArcAgent>) -> FrameworkResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(WorkflowInner { config, sub_agents }),
        })
    }

    pub fn sequential(
        name: impl Into<String>,
        description: impl Into<String>,
        sub_agents: Vec<ArcAgent>,
    ) -> FrameworkResult<Self> {
        Self::new(WorkflowConfig::sequential(name, description), sub_agents)
    }

    pub fn parallel(
        name: impl Into<String>,
        description: impl Into<String>,
        sub_agents: Vec<ArcAgent>,
    ) -> FrameworkResult<Self> {
        Self::new(WorkflowConfig::parallel(name, description), sub_agents)
    }

    pub fn looping(
        name: impl Into<String>,
        description: impl Into<String>,
        sub_agents: Vec<ArcAgent>,
        max_iterations: usize,
    ) -> FrameworkResult<Self> {
        Self::new(
            WorkflowConfig::looping(name, description, max_iterations),
            sub_agents,
        )
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.inner.config
    }

    pub fn mode(&self) -> &WorkflowMode {
        &self.inner.config.mode
    }

    pub fn sub_agents(&self) -> &[ArcAgent] {
        &self.inner.sub_agents
    }

    fn start(
        &self,
        ctx: AgentContext,
        input: Arc<AgentInput>,
        resume: Option<WorkflowInterruptInfo>,
        options: AgentRunOptions,
    ) -> AgentEventStream {
        let (ctx, run_ctx) = ctx.ensure_run_ctx(self.name(), &input);
        let inner = self.inner.clone();
        spawn_producer(self.name(), run_ctx.run_path().to_vec(), move |tx| async move {
            inner.execute(ctx, tx, input, resume, options).await
        })
    }
}

impl Agent for WorkflowAgent {
    fn name(&self) -> &str {
        &self.inner.config.name
    }

    fn description(&self) -> &str {
        &self.inner.config.description
    }

    fn run(
        &self,
        ctx: AgentContext,
        input: Arc<AgentInput>,
        options: AgentRunOptions,
    ) -> AgentEventStream {
        self.start(ctx, input, None, options)
    }

    fn as_resumable(&self) -> Option<&dyn ResumableAgent> {
        Some(self)
    }
}

impl ResumableAgent for WorkflowAgent {
    fn resume(
        &self,
        ctx: AgentContext,
        info: ResumeInfo,
        options: AgentRunOptions,
    ) -> AgentEventStream {
        let coordinate = match info.interrupt_info.data {
            InterruptData::Workflow(coordinate) => *coordinate,
            other => {
                tracing::warn!(agent = %self.name(), actual = other.type_name(), "Resume with foreign interrupt data");
                return AgentEventStream::from_error(
                    self.name(),
                    FrameworkError::InterruptDataMismatch {
                        expected: type_name::<WorkflowInterruptInfo>(),
                        actual: other.type_name(),
                    },
                );
            }
        };

        let input = coordinate.orig_input.clone();
        self.start(ctx, input, Some(coordinate), options)
    }
}

impl WorkflowInner {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    async fn execute(
        self: Arc<Self>,
        ctx: AgentContext,
        tx: EventSender,
        input: Arc<AgentInput>,
        resume: Option<WorkflowInterruptInfo>,
        options: AgentRunOptions,
    ) -> FrameworkResult<()> {
        let run_path = ctx.run_ctx().map(|r| r.path_string()).unwrap_or_default();
        tracing::debug!(
            agent = %self.name(),
            mode = %self.config.mode,
            run_path = %run_path,
            resuming = resume.is_some(),
            state = %WorkflowState::Running,
            "Workflow started"
        );

        if let Some(coordinate) = &resume {
            self.check_resume(coordinate)?;
        }

        let resume = resume.as_ref();
        let state = match &self.config.mode {
            WorkflowMode::Sequential => {
                self.sequential_pass(&ctx, &tx, &input, resume, &options, None)
                    .await?
            }
            WorkflowMode::Loop => self.run_loop(&ctx, &tx, &input, resume, &options).await?,
            WorkflowMode::Parallel => {
                self.run_parallel(&ctx, &tx, &input, resume, &options)
                    .await?
            }
            WorkflowMode::Unknown(mode) => {
                return Err(FrameworkError::UnsupportedMode(mode.clone()));
            }
        };

        match &state {
            WorkflowState::Failed { message } => {
                tracing::warn!(agent = %self.name(), run_path = %run_path, error = %message, "Workflow failed");
            }
            state => {
                tracing::debug!(agent = %self.name(), run_path = %run_path, state = %state, "Workflow finished");
            }
        }
        Ok(())
    }

    /// Reject a coordinate this workflow cannot resume from
    ///
    /// Runs before any sub-agent is started so a bad coordinate never
    /// resumes part of the workflow.
    fn check_resume(&self, coordinate: &WorkflowInterruptInfo) -> FrameworkResult<()> {
        let targets: Vec<(usize, bool)> = match &self.config.mode {
            WorkflowMode::Sequential | WorkflowMode::Loop => {
                if matches!(self.config.mode, WorkflowMode::Loop)
                    && coordinate.loop_iterations >= self.config.max_iterations
                {
                    return Err(FrameworkError::InvalidResumeCoordinate(format!(
                        "loop iteration {} is past max_iterations {}",
                        coordinate.loop_iterations, self.config.max_iterations
                    )));
                }
                vec![(
                    coordinate.sequential_interrupt_index,
                    coordinate.sequential_interrupt_info.is_some(),
                )]
            }
            WorkflowMode::Parallel => {
                if coordinate.parallel_interrupt_info.is_empty() {
                    return Err(FrameworkError::InvalidResumeCoordinate(
                        "no interrupted branch to resume".to_string(),
                    ));
                }
                coordinate
                    .parallel_interrupt_info
                    .keys()
                    .map(|&index| (index, true))
                    .collect()
            }
            WorkflowMode::Unknown(_) => return Ok(()),
        };

        for (index, has_info) in targets {
            let agent = self.sub_agents.get(index).ok_or_else(|| {
                FrameworkError::InvalidResumeCoordinate(format!(
                    "sub-agent index {} out of range for {} sub-agents",
                    index,
                    self.sub_agents.len()
                ))
            })?;
            if !has_info {
                return Err(FrameworkError::MissingInterruptInfo(agent.name().to_string()));
            }
            if agent.as_resumable().is_none() {
                return Err(FrameworkError::NotResumable(agent.name().to_string()));
            }
        }
        Ok(())
    }

    /// An event issued by the workflow itself, at its own run path
    pub fn own_event(&self, ctx: &AgentContext, mut event: AgentEvent) -> AgentEvent {
        event.agent_name = self.name().to_string();
        event.run_path = ctx
            .run_ctx()
            .map(|r| r.run_path().to_vec())
            .unwrap_or_default();
        event
    }
}

/// Error message carried by a failed sub-agent event
pub(super) fn error_message(event: &AgentEvent) -> String {
    event
        .err
        .as_ref()
        .map(|e| e.to_string())
        .unwrap_or_default()
}
