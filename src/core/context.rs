//! Agent context - ambient state passed to every agent call

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::message::AgentInput;
use crate::serialization::{DynValue, Dynamic};
use crate::session::{PendingInterrupt, RunContext, RunSession};

/// Context handed to `Agent::run` and `ResumableAgent::resume`
///
/// Carries the caller's run context, if any, and a cancellation token.
/// Cancellation is advisory: workflows pass the token down unchanged and
/// leave it to leaf agents to honor it.
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    run_ctx: Option<RunContext>,
    /// Agent whose step the invoker already pushed onto `run_ctx`
    entered: Option<String>,
    cancellation: CancellationToken,
}

impl AgentContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `token` for cancellation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn run_ctx(&self) -> Option<&RunContext> {
        self.run_ctx.as_ref()
    }

    pub fn with_run_ctx(&self, run_ctx: RunContext) -> Self {
        Self {
            run_ctx: Some(run_ctx),
            entered: None,
            cancellation: self.cancellation.clone(),
        }
    }

    /// Mark the run context as already entered for `agent_name`
    ///
    /// Used when the invoker restores a context whose last step is the
    /// agent it is about to call.
    pub fn entered_as(mut self, agent_name: impl Into<String>) -> Self {
        self.entered = Some(agent_name.into());
        self
    }

    /// Detach from any inherited run context
    ///
    /// The next agent invoked with the result starts a new root run.
    pub fn clear_run_ctx(&self) -> Self {
        Self {
            run_ctx: None,
            entered: None,
            cancellation: self.cancellation.clone(),
        }
    }

    /// Derive the run context for `agent_name`
    ///
    /// Extends the ambient context by one step, or starts a fresh session
    /// when there is none.
    pub fn init_run_ctx(&self, agent_name: &str, input: &Arc<AgentInput>) -> (Self, RunContext) {
        let run_ctx = match &self.run_ctx {
            Some(parent) => parent.derive_child(agent_name, input),
            None => RunContext::new(Arc::new(RunSession::new())).derive_child(agent_name, input),
        };
        (self.with_run_ctx(run_ctx.clone()).entered_as(agent_name), run_ctx)
    }

    /// Run context of `agent_name` for this call
    ///
    /// Keeps the context when the invoker already entered `agent_name`,
    /// otherwise pushes its step onto the ambient context.
    pub fn ensure_run_ctx(&self, agent_name: &str, input: &Arc<AgentInput>) -> (Self, RunContext) {
        match (&self.run_ctx, &self.entered) {
            (Some(run_ctx), Some(entered)) if entered == agent_name => {
                (self.clone(), run_ctx.clone())
            }
            _ => self.init_run_ctx(agent_name, input),
        }
    }

    pub fn session(&self) -> Option<&Arc<RunSession>> {
        self.run_ctx.as_ref().map(RunContext::session)
    }

    /// Store a value visible to every agent of this run
    ///
    /// No-op outside a run.
    pub fn add_session_value(&self, key: impl Into<String>, value: impl DynValue) {
        if let Some(session) = self.session() {
            session.add_value(key, Dynamic::new(value));
        }
    }

    pub fn add_session_values(&self, values: HashMap<String, Dynamic>) {
        if let Some(session) = self.session() {
            session.add_values(values);
        }
    }

    pub fn session_value(&self, key: &str) -> Option<Dynamic> {
        self.session()?.value(key)
    }

    pub fn session_values(&self) -> HashMap<String, Dynamic> {
        self.session().map(|s| s.values()).unwrap_or_default()
    }

    /// Record this context as the pending interrupt of its lineage
    pub fn replace_interrupt_run_ctx(&self) {
        if let Some(run_ctx) = &self.run_ctx {
            run_ctx.session().replace_interrupt_run_ctx(PendingInterrupt {
                run_path: run_ctx.run_path().to_vec(),
                root_input: run_ctx.root_input().cloned(),
            });
        }
    }

    pub fn interrupt_run_ctxs(&self) -> Vec<PendingInterrupt> {
        self.session()
            .map(|s| s.interrupt_run_ctxs())
            .unwrap_or_default()
    }
}
