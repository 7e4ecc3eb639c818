//! Run context
//!
//! A `RunContext` locates one agent invocation inside the run tree. The
//! path is owned per branch; the session behind it is shared by every
//! context derived from the same root.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::session::{RunSession, SessionSnapshot};
use crate::core::AgentInput;

/// One segment of a run path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunStep {
    agent_name: String,
}

impl RunStep {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.agent_name)
    }
}

/// Check whether one path is a prefix of the other
pub fn same_lineage(a: &[RunStep], b: &[RunStep]) -> bool {
    let len = a.len().min(b.len());
    a[..len] == b[..len]
}

/// Render a path as `a/b/c`
pub fn format_run_path(path: &[RunStep]) -> String {
    path.iter()
        .map(RunStep::agent_name)
        .collect::<Vec<_>>()
        .join("/")
}

/// Position of an invocation plus the session it writes to
#[derive(Clone)]
pub struct RunContext {
    root_input: Option<Arc<AgentInput>>,
    run_path: Vec<RunStep>,
    session: Arc<RunSession>,
}

impl RunContext {
    /// Create an empty context over `session`; derive from it to get a root
    pub fn new(session: Arc<RunSession>) -> Self {
        Self {
            root_input: None,
            run_path: Vec::new(),
            session,
        }
    }

    /// Derive the context of a nested invocation
    ///
    /// The path is copied and extended by one step; the session is shared.
    pub fn derive_child(&self, agent_name: &str, input: &Arc<AgentInput>) -> Self {
        let mut run_path = Vec::with_capacity(self.run_path.len() + 1);
        run_path.extend_from_slice(&self.run_path);
        run_path.push(RunStep::new(agent_name));

        let root_input = if run_path.len() == 1 {
            Some(input.clone())
        } else {
            self.root_input.clone()
        };

        Self {
            root_input,
            run_path,
            session: self.session.clone(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.run_path.len() == 1
    }

    pub fn run_path(&self) -> &[RunStep] {
        &self.run_path
    }

    pub fn root_input(&self) -> Option<&Arc<AgentInput>> {
        self.root_input.as_ref()
    }

    pub fn session(&self) -> &Arc<RunSession> {
        &self.session
    }

    /// Path as `a/b/c`, for logging
    pub fn path_string(&self) -> String {
        format_run_path(&self.run_path)
    }

    /// Capture path, root input and session contents
    pub fn snapshot(&self) -> RunContextSnapshot {
        RunContextSnapshot {
            root_input: self.root_input.as_deref().cloned(),
            run_path: self.run_path.clone(),
            session: self.session.snapshot(),
        }
    }

    /// Rebuild a context, with a fresh session, from a snapshot
    pub fn restore(snapshot: RunContextSnapshot) -> Self {
        Self {
            root_input: snapshot.root_input.map(Arc::new),
            run_path: snapshot.run_path,
            session: Arc::new(RunSession::from_snapshot(snapshot.session)),
        }
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("run_path", &self.path_string())
            .field("session_id", &self.session.id())
            .finish()
    }
}

/// Persistable form of a [`RunContext`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunContextSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_input: Option<AgentInput>,
    pub run_path: Vec<RunStep>,
    pub session: SessionSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &str) -> Arc<AgentInput> {
        Arc::new(AgentInput::from_text(text))
    }

    #[test]
    fn test_derive_child_pushes_one_step() {
        let base = RunContext::new(Arc::new(RunSession::new()));
        let root = base.derive_child("wf", &input("root"));
        assert!(root.is_root());
        assert_eq!(root.root_input().unwrap().messages[0].content, "root");

        let child = root.derive_child("a", &input("ignored"));
        assert!(!child.is_root());
        assert_eq!(child.path_string(), "wf/a");
        assert_eq!(child.root_input().unwrap().messages[0].content, "root");

        // Paths are independent, the session is shared
        assert_eq!(root.run_path().len(), 1);
        assert!(Arc::ptr_eq(root.session(), child.session()));
    }

    #[test]
    fn test_same_lineage() {
        let ab = vec![RunStep::new("a"), RunStep::new("b")];
        let abc = vec![RunStep::new("a"), RunStep::new("b"), RunStep::new("c")];
        let ad = vec![RunStep::new("a"), RunStep::new("d")];

        assert!(same_lineage(&ab, &abc));
        assert!(same_lineage(&abc, &ab));
        assert!(same_lineage(&ab, &ab));
        assert!(!same_lineage(&ab, &ad));
    }

    #[test]
    fn test_snapshot_restore() {
        let root = RunContext::new(Arc::new(RunSession::new())).derive_child("wf", &input("hi"));
        root.session().add_value("k", crate::serialization::Dynamic::new(3i64));

        let restored = RunContext::restore(root.snapshot());
        assert_eq!(restored.path_string(), "wf");
        assert_eq!(restored.session().value("k").unwrap().downcast_ref::<i64>(), Some(&3));
        assert_ne!(restored.session().id(), root.session().id());
    }
}
