//! Mock agents shared by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_stream::stream;

use crate::agent::{Agent, AgentRunOptions, InterruptInfo, ResumableAgent, ResumeInfo};
use crate::core::{AgentAction, AgentContext, AgentEvent, AgentInput, Message};
use crate::runtime::AgentEventStream;

fn replay(name: &str, events: Vec<AgentEvent>) -> AgentEventStream {
    let name = name.to_string();
    AgentEventStream::from_stream(stream! {
        for mut event in events {
            if event.agent_name.is_empty() {
                event.agent_name = name.clone();
            }
            yield event;
        }
    })
}

/// Message event without an agent name; the invoker stamps it
pub fn reply(text: &str) -> AgentEvent {
    AgentEvent::message("", Message::assistant(text))
}

pub fn action(action: AgentAction) -> AgentEvent {
    AgentEvent::action("", action)
}

/// Replays a fixed script on `run` and another on `resume`
pub struct ScriptedAgent {
    name: String,
    events: Vec<AgentEvent>,
    resume_events: Vec<AgentEvent>,
    runs: Arc<AtomicUsize>,
    resumes: Arc<AtomicUsize>,
}

impl ScriptedAgent {
    pub fn new(name: &str, events: Vec<AgentEvent>) -> Self {
        Self {
            name: name.to_string(),
            events,
            resume_events: Vec::new(),
            runs: Arc::new(AtomicUsize::new(0)),
            resumes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// One message event per text
    pub fn replies(name: &str, texts: &[&str]) -> Self {
        Self::new(name, texts.iter().map(|t| reply(t)).collect())
    }

    /// Says `before`, interrupts with `payload`, then says `after` on resume
    pub fn interrupting(name: &str, before: &str, payload: &str, after: &str) -> Self {
        Self::new(
            name,
            vec![
                reply(before),
                action(AgentAction::interrupted(InterruptInfo::opaque(payload.to_string()))),
            ],
        )
        .with_resume_events(vec![reply(after)])
    }

    pub fn with_resume_events(mut self, events: Vec<AgentEvent>) -> Self {
        self.resume_events = events;
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn resumes(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }
}

impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "scripted test agent"
    }

    fn run(&self, _ctx: AgentContext, _input: Arc<AgentInput>, _options: AgentRunOptions) -> AgentEventStream {
        self.runs.fetch_add(1, Ordering::SeqCst);
        replay(&self.name, self.events.clone())
    }

    fn as_resumable(&self) -> Option<&dyn ResumableAgent> {
        Some(self)
    }
}

impl ResumableAgent for ScriptedAgent {
    fn resume(&self, _ctx: AgentContext, info: ResumeInfo, _options: AgentRunOptions) -> AgentEventStream {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        let mut events = self.resume_events.clone();
        if let Some(payload) = info.interrupt_info.opaque_as::<String>() {
            events.insert(0, reply(&format!("resumed with {}", payload)));
        }
        replay(&self.name, events)
    }
}

/// An agent without resume support
pub struct PlainAgent {
    name: String,
}

impl PlainAgent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Agent for PlainAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "plain test agent"
    }

    fn run(&self, _ctx: AgentContext, _input: Arc<AgentInput>, _options: AgentRunOptions) -> AgentEventStream {
        replay(&self.name, vec![reply("plain")])
    }
}

/// Panics as soon as it is invoked or resumed
pub struct PanickingAgent;

impl Agent for PanickingAgent {
    fn name(&self) -> &str {
        "panicker"
    }

    fn description(&self) -> &str {
        "panics on run"
    }

    fn run(&self, _ctx: AgentContext, _input: Arc<AgentInput>, _options: AgentRunOptions) -> AgentEventStream {
        panic!("sub-agent blew up")
    }

    fn as_resumable(&self) -> Option<&dyn ResumableAgent> {
        Some(self)
    }
}

impl ResumableAgent for PanickingAgent {
    fn resume(&self, _ctx: AgentContext, _info: ResumeInfo, _options: AgentRunOptions) -> AgentEventStream {
        panic!("sub-agent blew up on resume")
    }
}

type Behavior = dyn Fn(&AgentContext, &AgentRunOptions) -> Vec<AgentEvent> + Send + Sync;

/// Builds its events from the context it is invoked with
pub struct FnAgent {
    name: String,
    behavior: Box<Behavior>,
}

impl FnAgent {
    pub fn new<F>(name: &str, behavior: F) -> Self
    where
        F: Fn(&AgentContext, &AgentRunOptions) -> Vec<AgentEvent> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            behavior: Box::new(behavior),
        }
    }

    /// Replies with the run path it was invoked at
    pub fn path_echo(name: &str) -> Self {
        Self::new(name, |ctx, _| {
            let path = ctx.run_ctx().map(|r| r.path_string()).unwrap_or_default();
            vec![reply(&path)]
        })
    }
}

impl Agent for FnAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "closure test agent"
    }

    fn run(&self, ctx: AgentContext, _input: Arc<AgentInput>, options: AgentRunOptions) -> AgentEventStream {
        replay(&self.name, (self.behavior)(&ctx, &options))
    }
}

/// Message texts of the events, in order
pub fn texts(events: &[AgentEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.message_content().map(str::to_string))
        .collect()
}
