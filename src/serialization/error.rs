//! Serializer error types

use thiserror::Error;

/// Errors raised while encoding or decoding checkpoint payloads
#[derive(Error, Debug)]
pub enum SerializationError {
    /// A dynamic value holds a type the registry does not know
    #[error("type `{0}` is not registered")]
    NotRegistered(&'static str),

    /// An encoded value names a type the registry does not know
    #[error("unknown type name `{0}`")]
    UnknownTypeName(String),

    /// The name is already taken by another type
    #[error("type name `{name}` is already registered for `{existing}`")]
    NameConflict {
        name: String,
        existing: &'static str,
    },

    /// The type is already registered under another name
    #[error("type `{rust_name}` is already registered as `{existing}`")]
    TypeConflict {
        rust_name: &'static str,
        existing: String,
    },

    /// Decoding into a slot that holds no value
    #[error("value must be a non-nil pointer: {0}")]
    NilDestination(String),

    /// The encoded value does not fit the destination type
    #[error("cannot assign `{from}` to `{to}`: {reason}")]
    CannotAssign {
        from: String,
        to: &'static str,
        reason: String,
    },

    /// A dynamic slot was decoded from a value that carries no type tag
    #[error("missing type tag for dynamic value")]
    MissingTypeTag,

    /// `Dynamic` was encoded or decoded outside a serializer call
    #[error("no type registry is active; use GenericSerializer to encode dynamic values")]
    NoActiveRegistry,

    /// Failure reported by a custom encode/decode hook
    #[error("{0}")]
    Custom(String),

    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SerializationError {
    /// Create an error from a custom hook
    pub fn custom(msg: impl Into<String>) -> Self {
        SerializationError::Custom(msg.into())
    }
}

pub type SerializationResult<T> = Result<T, SerializationError>;
