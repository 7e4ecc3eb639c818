use std::sync::Arc;

use shadow_workflow_sdk::agent::{
    Agent, AgentRunOptions, ArcAgent, InterruptInfo, ResumableAgent, ResumeInfo,
};
use shadow_workflow_sdk::checkpoint::FileCheckPointStore;
use shadow_workflow_sdk::core::{AgentAction, AgentContext, AgentEvent, AgentInput, Message};
use shadow_workflow_sdk::logging::{self, LoggingConfig};
use shadow_workflow_sdk::runtime::{AgentEventStream, Runner};
use shadow_workflow_sdk::workflow::WorkflowAgent;

const CHECKPOINT_ID: &str = "demo-run";

/// Replies with a fixed line
struct EchoAgent {
    name: String,
    line: String,
}

impl EchoAgent {
    fn new(name: &str, line: &str) -> ArcAgent {
        Arc::new(Self {
            name: name.to_string(),
            line: line.to_string(),
        })
    }
}

impl Agent for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "replies with a fixed line"
    }

    fn run(&self, _ctx: AgentContext, _input: Arc<AgentInput>, _options: AgentRunOptions) -> AgentEventStream {
        AgentEventStream::from_events(vec![AgentEvent::message(
            self.name.clone(),
            Message::assistant(self.line.clone()),
        )])
    }
}

/// Stops the run until someone approves the draft
struct ApprovalAgent;

impl Agent for ApprovalAgent {
    fn name(&self) -> &str {
        "reviewer"
    }

    fn description(&self) -> &str {
        "asks for approval before publishing"
    }

    fn run(&self, _ctx: AgentContext, _input: Arc<AgentInput>, _options: AgentRunOptions) -> AgentEventStream {
        AgentEventStream::from_events(vec![
            AgentEvent::message("reviewer", Message::assistant("Draft ready, waiting for approval")),
            AgentEvent::action(
                "reviewer",
                AgentAction::interrupted(InterruptInfo::opaque("approve draft?".to_string())),
            ),
        ])
    }

    fn as_resumable(&self) -> Option<&dyn ResumableAgent> {
        Some(self)
    }
}

impl ResumableAgent for ApprovalAgent {
    fn resume(&self, _ctx: AgentContext, info: ResumeInfo, _options: AgentRunOptions) -> AgentEventStream {
        let question = info
            .interrupt_info
            .opaque_as::<String>()
            .cloned()
            .unwrap_or_default();
        AgentEventStream::from_events(vec![AgentEvent::message(
            "reviewer",
            Message::assistant(format!("Approved: {}", question)),
        )])
    }
}

fn print_events(events: &[AgentEvent]) {
    for event in events {
        let path = shadow_workflow_sdk::session::format_run_path(&event.run_path);
        if let Some(text) = event.message_content() {
            println!("[{}] {}", path, text);
        } else if event.is_interrupted() {
            println!("[{}] interrupted", path);
        } else if let Some(err) = &event.err {
            println!("[{}] error: {}", path, err);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = logging::init_logging(&LoggingConfig::from_env())?;

    tracing::info!("=== Workflow Demo Starting ===");

    let workflow = WorkflowAgent::sequential(
        "publisher",
        "writes, reviews and publishes a post",
        vec![
            EchoAgent::new("writer", "Wrote a draft"),
            Arc::new(ApprovalAgent),
            EchoAgent::new("publisher-bot", "Published"),
        ],
    )?;

    let runner = Runner::new(Arc::new(workflow))
        .with_checkpoint_store(Arc::new(FileCheckPointStore::new()));

    println!("=== First run ===");
    let events = runner
        .query(
            "Publish today's post",
            AgentRunOptions::new().with_checkpoint_id(CHECKPOINT_ID),
        )
        .collect_all()
        .await;
    print_events(&events);

    println!("\n=== Resume ===");
    let events = runner
        .resume(CHECKPOINT_ID, AgentRunOptions::new())
        .await?
        .collect_all()
        .await;
    print_events(&events);

    tracing::info!("=== Workflow Demo Finished ===");

    Ok(())
}
