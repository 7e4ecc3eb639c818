//! Run session
//!
//! Shared mutable state of one root run: the event log, a string-keyed
//! value store and the pending interrupt records. Every access goes
//! through one mutex and reads hand back copies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::run_context::{same_lineage, RunStep};
use crate::core::{AgentEvent, AgentInput};
use crate::serialization::Dynamic;

/// An interrupted invocation awaiting resume
#[derive(Debug, Clone)]
pub struct PendingInterrupt {
    pub run_path: Vec<RunStep>,
    pub root_input: Option<Arc<AgentInput>>,
}

#[derive(Default)]
struct SessionState {
    events: Vec<AgentEvent>,
    values: HashMap<String, Dynamic>,
    interrupts: Vec<PendingInterrupt>,
}

/// State shared by every context of one root run
pub struct RunSession {
    id: String,
    state: Mutex<SessionState>,
}

impl Default for RunSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Rebuild a session from persisted events and values
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: Mutex::new(SessionState {
                events: snapshot.events,
                values: snapshot.values,
                interrupts: Vec::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_event(&self, event: AgentEvent) {
        self.lock().events.push(event);
    }

    pub fn events(&self) -> Vec<AgentEvent> {
        self.lock().events.clone()
    }

    pub fn add_value(&self, key: impl Into<String>, value: Dynamic) {
        self.lock().values.insert(key.into(), value);
    }

    pub fn add_values(&self, values: HashMap<String, Dynamic>) {
        self.lock().values.extend(values);
    }

    pub fn value(&self, key: &str) -> Option<Dynamic> {
        self.lock().values.get(key).cloned()
    }

    pub fn values(&self) -> HashMap<String, Dynamic> {
        self.lock().values.clone()
    }

    /// Record an interrupt raised by an agent of this run
    ///
    /// Any record on the same lineage (an ancestor, the same path or a
    /// descendant) is superseded.
    pub fn append_interrupt_run_ctx(&self, pending: PendingInterrupt) {
        self.insert_interrupt(pending);
    }

    /// Record an interrupt on behalf of a workflow wrapping its sub-agents'
    pub fn replace_interrupt_run_ctx(&self, pending: PendingInterrupt) {
        self.insert_interrupt(pending);
    }

    fn insert_interrupt(&self, pending: PendingInterrupt) {
        let mut state = self.lock();
        state
            .interrupts
            .retain(|existing| !same_lineage(&existing.run_path, &pending.run_path));
        state.interrupts.push(pending);
    }

    pub fn interrupt_run_ctxs(&self) -> Vec<PendingInterrupt> {
        self.lock().interrupts.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            events: state.events.clone(),
            values: state.values.clone(),
        }
    }
}

impl std::fmt::Debug for RunSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RunSession")
            .field("id", &self.id)
            .field("events", &state.events.len())
            .field("values", &state.values.len())
            .field("interrupts", &state.interrupts.len())
            .finish()
    }
}

/// Persisted session contents; pending interrupts are not kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub events: Vec<AgentEvent>,
    #[serde(default)]
    pub values: HashMap<String, Dynamic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;

    fn pending(path: &[&str]) -> PendingInterrupt {
        PendingInterrupt {
            run_path: path.iter().map(|s| RunStep::new(*s)).collect(),
            root_input: None,
        }
    }

    fn paths(session: &RunSession) -> Vec<String> {
        session
            .interrupt_run_ctxs()
            .iter()
            .map(|p| crate::session::format_run_path(&p.run_path))
            .collect()
    }

    #[test]
    fn test_values_are_copies() {
        let session = RunSession::new();
        session.add_value("n", Dynamic::new(1i64));
        session.add_values(HashMap::from([("s".to_string(), Dynamic::new("x".to_string()))]));

        let mut copy = session.values();
        copy.insert("n".into(), Dynamic::new(2i64));

        assert_eq!(session.value("n").unwrap().downcast_ref::<i64>(), Some(&1));
        assert_eq!(session.values().len(), 2);
        assert!(session.value("missing").is_none());
    }

    #[test]
    fn test_event_log_appends() {
        let session = RunSession::new();
        session.add_event(AgentEvent::message("a", Message::assistant("1")));
        session.add_event(AgentEvent::message("b", Message::assistant("2")));

        let events = session.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].agent_name, "b");
    }

    #[test]
    fn test_replace_dedups_lineage() {
        let session = RunSession::new();
        session.append_interrupt_run_ctx(pending(&["wf", "par", "a"]));
        session.append_interrupt_run_ctx(pending(&["wf", "par", "b"]));
        session.append_interrupt_run_ctx(pending(&["wf", "other"]));
        assert_eq!(paths(&session).len(), 3);

        session.replace_interrupt_run_ctx(pending(&["wf", "par"]));
        assert_eq!(paths(&session), vec!["wf/other", "wf/par"]);

        session.replace_interrupt_run_ctx(pending(&["wf"]));
        assert_eq!(paths(&session), vec!["wf"]);
    }

    #[test]
    fn test_append_supersedes_lineage() {
        let session = RunSession::new();
        session.append_interrupt_run_ctx(pending(&["wf", "seq"]));
        session.append_interrupt_run_ctx(pending(&["wf", "seq", "leaf"]));
        assert_eq!(paths(&session), vec!["wf/seq/leaf"]);

        session.append_interrupt_run_ctx(pending(&["wf", "other"]));
        session.append_interrupt_run_ctx(pending(&["wf", "seq"]));
        assert_eq!(paths(&session), vec!["wf/other", "wf/seq"]);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let session = RunSession::new();
        session.add_event(AgentEvent::message("a", Message::assistant("1")));
        session.add_value("k", Dynamic::new(true));
        session.append_interrupt_run_ctx(pending(&["wf"]));

        let restored = RunSession::from_snapshot(session.snapshot());
        assert_eq!(restored.events().len(), 1);
        assert_eq!(restored.value("k").unwrap().downcast_ref::<bool>(), Some(&true));
        assert!(restored.interrupt_run_ctxs().is_empty());
    }
}
