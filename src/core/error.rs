//! Framework error types

use thiserror::Error;

use crate::serialization::SerializationError;

/// Errors that can occur in the workflow framework
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// A sub-agent reported a fatal error
    #[error("Agent error: {0}")]
    AgentError(String),

    /// A producer task panicked
    #[error("panic: {0}")]
    Panic(String),

    /// The workflow was configured with a mode it cannot execute
    #[error("unsupported workflow agent mode: {0}")]
    UnsupportedMode(String),

    /// Resume was called with interrupt data of the wrong shape
    #[error("interrupt data is expected to be `{expected}`, actual: `{actual}`")]
    InterruptDataMismatch {
        /// Type the agent expected
        expected: &'static str,
        /// Type that was supplied
        actual: &'static str,
    },

    /// A resume coordinate did not carry the nested interrupt info it needs
    #[error("Missing interrupt info: {0}")]
    MissingInterruptInfo(String),

    /// A resume coordinate points outside the workflow it was given to
    #[error("invalid resume coordinate: {0}")]
    InvalidResumeCoordinate(String),

    /// Resume targeted an agent that cannot be resumed
    #[error("Agent does not support resume: {0}")]
    NotResumable(String),

    /// Checkpoint lookup failed
    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(String),

    /// Checkpoint store failure
    #[error("Checkpoint store error: {0}")]
    Store(String),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    ChannelClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Checkpoint payload codec error
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl FrameworkError {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        FrameworkError::Other(msg.into())
    }

    /// Create a sub-agent error
    pub fn agent_error(msg: impl Into<String>) -> Self {
        FrameworkError::AgentError(msg.into())
    }

    /// Check whether this error came from a recovered panic
    pub fn is_panic(&self) -> bool {
        matches!(self, FrameworkError::Panic(_))
    }
}

/// Result type alias for framework operations
pub type FrameworkResult<T> = Result<T, FrameworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FrameworkError::UnsupportedMode("fanout".into());
        assert_eq!(err.to_string(), "unsupported workflow agent mode: fanout");

        let err = FrameworkError::ChannelClosed;
        assert_eq!(err.to_string(), "Channel closed");

        let err = FrameworkError::Panic("boom".into());
        assert!(err.is_panic());
        assert_eq!(err.to_string(), "panic: boom");
    }

    #[test]
    fn test_mismatch_names_both_types() {
        let err = FrameworkError::InterruptDataMismatch {
            expected: "WorkflowInterruptInfo",
            actual: "alloc::string::String",
        };
        let msg = err.to_string();
        assert!(msg.contains("WorkflowInterruptInfo"));
        assert!(msg.contains("actual: `alloc::string::String`"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let framework_err: FrameworkError = io_err.into();
        assert!(matches!(framework_err, FrameworkError::Io(_)));
    }
}
