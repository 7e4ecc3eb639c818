//! Runner - entry point for driving a root agent
//!
//! The runner starts a fresh run session for each call, relays the root
//! agent's events and, when a checkpoint id and store are configured,
//! persists the run after an interrupt so it can be resumed later.

use std::sync::Arc;

use super::channels::AgentEventStream;
use super::invocation::record_event;
use super::producer::spawn_producer;
use crate::agent::{AgentRunOptions, ArcAgent, InterruptInfo, ResumeInfo};
use crate::checkpoint::{CheckPointStore, Checkpoint};
use crate::core::{AgentContext, AgentInput, FrameworkError, FrameworkResult, Message};
use crate::serialization::GenericSerializer;
use crate::session::RunContext;

/// Drives a root agent and manages its checkpoints
#[derive(Clone)]
pub struct Runner {
    agent: ArcAgent,
    enable_streaming: bool,
    store: Option<Arc<dyn CheckPointStore>>,
    serializer: GenericSerializer,
}

impl Runner {
    pub fn new(agent: ArcAgent) -> Self {
        Self {
            agent,
            enable_streaming: false,
            store: None,
            serializer: GenericSerializer::default(),
        }
    }

    /// Ask agents to stream their output
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.enable_streaming = enabled;
        self
    }

    /// Persist interrupted runs into `store`
    pub fn with_checkpoint_store(mut self, store: Arc<dyn CheckPointStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Encode checkpoints with `serializer`
    ///
    /// Needed when interrupt payloads or session values carry custom types.
    pub fn with_serializer(mut self, serializer: GenericSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn agent(&self) -> &ArcAgent {
        &self.agent
    }

    /// Run the root agent on `messages`
    pub fn run(&self, messages: Vec<Message>, options: AgentRunOptions) -> AgentEventStream {
        let input = Arc::new(AgentInput::new(messages).with_streaming(self.enable_streaming));
        let (ctx, run_ctx) = AgentContext::new().init_run_ctx(self.agent.name(), &input);
        ctx.add_session_values(options.session_values.clone());

        tracing::info!(
            agent = %self.agent.name(),
            session_id = %run_ctx.session().id(),
            "Starting run"
        );

        let stream = self.agent.run(ctx, input, options.clone());
        self.relay(run_ctx, stream, options.checkpoint_id)
    }

    /// Run the root agent on a single user message
    pub fn query(&self, text: impl Into<String>, options: AgentRunOptions) -> AgentEventStream {
        self.run(vec![Message::user(text)], options)
    }

    /// Resume the run saved under `checkpoint_id`
    ///
    /// Fails when no store is configured, the checkpoint does not exist,
    /// or the root agent cannot be resumed.
    pub async fn resume(
        &self,
        checkpoint_id: &str,
        options: AgentRunOptions,
    ) -> FrameworkResult<AgentEventStream> {
        let store = self.store.as_ref().ok_or_else(|| {
            FrameworkError::InvalidConfig("resume requires a checkpoint store".to_string())
        })?;
        let checkpoint = Checkpoint::load(store.as_ref(), &self.serializer, checkpoint_id)
            .await?
            .ok_or_else(|| FrameworkError::CheckpointNotFound(checkpoint_id.to_string()))?;
        let resumable = self
            .agent
            .as_resumable()
            .ok_or_else(|| FrameworkError::NotResumable(self.agent.name().to_string()))?;

        let run_ctx = RunContext::restore(checkpoint.run_ctx);
        let ctx = AgentContext::new()
            .with_run_ctx(run_ctx.clone())
            .entered_as(self.agent.name());
        ctx.add_session_values(options.session_values.clone());

        tracing::info!(
            agent = %self.agent.name(),
            checkpoint_id = %checkpoint_id,
            saved_at = %checkpoint.saved_at,
            "Resuming run"
        );

        let info = ResumeInfo::new(checkpoint.info).with_streaming(self.enable_streaming);
        let stream = resumable.resume(ctx, info, options.clone());
        // A later interrupt overwrites the checkpoint it resumed from
        let checkpoint_id = options
            .checkpoint_id
            .or_else(|| Some(checkpoint_id.to_string()));
        Ok(self.relay(run_ctx, stream, checkpoint_id))
    }

    fn relay(
        &self,
        run_ctx: RunContext,
        mut stream: AgentEventStream,
        checkpoint_id: Option<String>,
    ) -> AgentEventStream {
        let agent_name = self.agent.name().to_string();
        let store = self.store.clone();
        let serializer = self.serializer.clone();
        let run_path = run_ctx.run_path().to_vec();

        spawn_producer(agent_name.clone(), run_path, move |tx| async move {
            let mut interrupt: Option<InterruptInfo> = None;

            while let Some(event) = stream.next().await {
                let event = record_event(&run_ctx, &agent_name, event);
                interrupt = match event.interrupt_info() {
                    Some(info) if event.run_path.as_slice() == run_ctx.run_path() => {
                        Some(info.clone())
                    }
                    _ => None,
                };
                tx.send(event).await?;
            }

            if let (Some(info), Some(id), Some(store)) = (interrupt, checkpoint_id, store) {
                Checkpoint::new(&run_ctx, info)
                    .save(store.as_ref(), &serializer, &id)
                    .await?;
                tracing::info!(agent = %agent_name, checkpoint_id = %id, "Run interrupted, checkpoint saved");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{FileCheckPointStore, InMemoryCheckPointStore};
    use crate::core::AgentEvent;
    use crate::test_support::{texts, PlainAgent, ScriptedAgent};
    use crate::workflow::WorkflowAgent;
    use tempfile::TempDir;

    fn interrupting_workflow() -> ArcAgent {
        Arc::new(
            WorkflowAgent::sequential(
                "pipeline",
                "three steps",
                vec![
                    Arc::new(ScriptedAgent::replies("first", &["one"])),
                    Arc::new(ScriptedAgent::interrupting("second", "two", "approve?", "two done")),
                    Arc::new(ScriptedAgent::replies("third", &["three"])),
                ],
            )
            .unwrap(),
        )
    }

    async fn interrupt_and_resume(store: Arc<dyn CheckPointStore>) -> (Vec<AgentEvent>, Vec<AgentEvent>) {
        let runner = Runner::new(interrupting_workflow()).with_checkpoint_store(store);

        let first = runner
            .query("go", AgentRunOptions::new().with_checkpoint_id("cp-1"))
            .collect_all()
            .await;
        let second = runner
            .resume("cp-1", AgentRunOptions::new())
            .await
            .unwrap()
            .collect_all()
            .await;
        (first, second)
    }

    #[tokio::test]
    async fn test_resume_from_memory_store() {
        let store = Arc::new(InMemoryCheckPointStore::new());
        let (first, second) = interrupt_and_resume(store.clone()).await;

        assert_eq!(texts(&first), vec!["one", "two"]);
        assert!(first.last().unwrap().is_interrupted());
        assert_eq!(first.last().unwrap().agent_name, "pipeline");
        assert_eq!(store.len().await, 1);

        assert_eq!(
            texts(&second),
            vec!["resumed with approve?", "two done", "three"]
        );
        assert!(second.iter().all(|e| !e.is_error()));
    }

    #[tokio::test]
    async fn test_resume_from_file_store() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(FileCheckPointStore::with_dir(temp.path()));
        let (first, second) = interrupt_and_resume(store).await;

        assert!(first.last().unwrap().is_interrupted());
        assert!(temp.path().join("cp-1").exists());
        assert_eq!(
            texts(&second),
            vec!["resumed with approve?", "two done", "three"]
        );
    }

    #[tokio::test]
    async fn test_session_values_seeded_from_options() {
        let runner = Runner::new(interrupting_workflow())
            .with_checkpoint_store(Arc::new(InMemoryCheckPointStore::new()));

        runner
            .query(
                "go",
                AgentRunOptions::new()
                    .with_checkpoint_id("cp")
                    .with_session_value("user", "ada".to_string()),
            )
            .collect_all()
            .await;

        let store = runner.store.clone().unwrap();
        let checkpoint = Checkpoint::load(store.as_ref(), &runner.serializer, "cp")
            .await
            .unwrap()
            .unwrap();
        let user = checkpoint.run_ctx.session.values.get("user").cloned().unwrap();
        assert_eq!(user.downcast_ref::<String>().map(String::as_str), Some("ada"));
    }

    #[tokio::test]
    async fn test_no_checkpoint_without_interrupt() {
        let store = Arc::new(InMemoryCheckPointStore::new());
        let agent: ArcAgent = Arc::new(ScriptedAgent::replies("solo", &["hi"]));
        let runner = Runner::new(agent).with_checkpoint_store(store.clone());

        let events = runner
            .query("go", AgentRunOptions::new().with_checkpoint_id("cp"))
            .collect_all()
            .await;
        assert_eq!(texts(&events), vec!["hi"]);
        assert_eq!(events[0].agent_name, "solo");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_resume_missing_checkpoint() {
        let runner = Runner::new(interrupting_workflow())
            .with_checkpoint_store(Arc::new(InMemoryCheckPointStore::new()));

        let err = runner.resume("nope", AgentRunOptions::new()).await.err().unwrap();
        assert!(matches!(err, FrameworkError::CheckpointNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_resume_requires_store_and_resumable_agent() {
        let err = Runner::new(interrupting_workflow())
            .resume("cp", AgentRunOptions::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FrameworkError::InvalidConfig(_)));

        let store = Arc::new(InMemoryCheckPointStore::new());
        let interrupted = Runner::new(interrupting_workflow()).with_checkpoint_store(store.clone());
        interrupted
            .query("go", AgentRunOptions::new().with_checkpoint_id("cp"))
            .collect_all()
            .await;

        let plain: ArcAgent = Arc::new(PlainAgent::new("plain"));
        let err = Runner::new(plain)
            .with_checkpoint_store(store)
            .resume("cp", AgentRunOptions::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FrameworkError::NotResumable(name) if name == "plain"));
    }
}
