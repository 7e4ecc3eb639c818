//! Events streamed FROM an agent

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::FrameworkError;
use super::message::Message;
use crate::agent::InterruptInfo;
use crate::serialization::{DynValue, Dynamic};
use crate::session::RunStep;

/// Payload produced by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentOutput {
    /// A chat message
    Message(Message),

    /// Arbitrary structured output
    Structured(Dynamic),
}

/// Break-loop request raised by a sub-agent inside a loop workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakLoopAction {
    /// Agent that asked to break
    pub from: String,

    /// Set by the loop that honored the request
    pub done: bool,

    /// Completed iterations when the loop broke
    pub current_iterations: usize,
}

/// Control-flow request attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentAction {
    /// Terminate the whole pipeline
    Exit,

    /// Suspend; the payload is needed to resume
    Interrupted(InterruptInfo),

    /// Stop the enclosing loop workflow
    BreakLoop(BreakLoopAction),
}

impl AgentAction {
    /// Create an exit action
    pub fn exit() -> Self {
        AgentAction::Exit
    }

    /// Create an interrupt action
    pub fn interrupted(info: InterruptInfo) -> Self {
        AgentAction::Interrupted(info)
    }

    /// Create a break-loop action originating from `from`
    pub fn break_loop(from: impl Into<String>) -> Self {
        AgentAction::BreakLoop(BreakLoopAction {
            from: from.into(),
            done: false,
            current_iterations: 0,
        })
    }
}

/// A single event emitted by an agent run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Name of the agent that produced the event
    pub agent_name: String,

    /// Position of the producing agent in the run tree
    #[serde(default)]
    pub run_path: Vec<RunStep>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<AgentOutput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AgentAction>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "error_text")]
    pub err: Option<Arc<FrameworkError>>,
}

impl AgentEvent {
    /// Create an event carrying a message
    pub fn message(agent_name: impl Into<String>, message: Message) -> Self {
        Self {
            agent_name: agent_name.into(),
            output: Some(AgentOutput::Message(message)),
            ..Default::default()
        }
    }

    /// Create an event carrying structured output
    pub fn structured(agent_name: impl Into<String>, value: impl DynValue) -> Self {
        Self {
            agent_name: agent_name.into(),
            output: Some(AgentOutput::Structured(Dynamic::new(value))),
            ..Default::default()
        }
    }

    /// Create an event carrying only an action
    pub fn action(agent_name: impl Into<String>, action: AgentAction) -> Self {
        Self {
            agent_name: agent_name.into(),
            action: Some(action),
            ..Default::default()
        }
    }

    /// Create an error event
    pub fn error(agent_name: impl Into<String>, err: FrameworkError) -> Self {
        Self {
            agent_name: agent_name.into(),
            err: Some(Arc::new(err)),
            ..Default::default()
        }
    }

    /// Attach an action to this event
    pub fn with_action(mut self, action: AgentAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Check if this event carries an error
    pub fn is_error(&self) -> bool {
        self.err.is_some()
    }

    /// Check if this event requests pipeline exit
    pub fn is_exit(&self) -> bool {
        matches!(self.action, Some(AgentAction::Exit))
    }

    /// Interrupt payload, if this event suspends the run
    pub fn interrupt_info(&self) -> Option<&InterruptInfo> {
        match &self.action {
            Some(AgentAction::Interrupted(info)) => Some(info),
            _ => None,
        }
    }

    /// Check if this event suspends the run
    pub fn is_interrupted(&self) -> bool {
        self.interrupt_info().is_some()
    }

    /// Break-loop payload, if any
    pub fn break_loop(&self) -> Option<&BreakLoopAction> {
        match &self.action {
            Some(AgentAction::BreakLoop(action)) => Some(action),
            _ => None,
        }
    }

    pub fn structured_output(&self) -> Option<&Dynamic> {
        match &self.output {
            Some(AgentOutput::Structured(value)) => Some(value),
            _ => None,
        }
    }

    /// Message content, if the output is a message
    pub fn message_content(&self) -> Option<&str> {
        match &self.output {
            Some(AgentOutput::Message(msg)) => Some(msg.content.as_str()),
            _ => None,
        }
    }
}

/// Errors travel as their display text; decoding yields `FrameworkError::Other`.
mod error_text {
    use std::sync::Arc;

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::core::error::FrameworkError;

    pub fn serialize<S: Serializer>(
        err: &Option<Arc<FrameworkError>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match err {
            Some(err) => serializer.serialize_some(&err.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Arc<FrameworkError>>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        Ok(text.map(|t| Arc::new(FrameworkError::Other(t))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::GenericSerializer;

    #[test]
    fn test_structured_output_round_trip() {
        let event = AgentEvent::structured("scorer", 42i64);
        assert_eq!(event.message_content(), None);

        let serializer = GenericSerializer::default();
        let back: AgentEvent = serializer
            .unmarshal(&serializer.marshal(&event).unwrap())
            .unwrap();
        let value = back.structured_output().unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&42));
        assert_eq!(back.agent_name, "scorer");
    }

    #[test]
    fn test_event_predicates() {
        let event = AgentEvent::message("a", Message::assistant("hi")).with_action(AgentAction::exit());
        assert!(event.is_exit());
        assert!(!event.is_error());
        assert_eq!(event.message_content(), Some("hi"));

        let event = AgentEvent::action("loop", AgentAction::break_loop("loop"));
        let brk = event.break_loop().unwrap();
        assert_eq!(brk.from, "loop");
        assert!(!brk.done);
    }

    #[test]
    fn test_error_event_json() {
        let event = AgentEvent::error("a", FrameworkError::agent_error("model unavailable"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Agent error: model unavailable"));

        let back: AgentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.err.unwrap().to_string(),
            "Agent error: model unavailable"
        );
    }
}
