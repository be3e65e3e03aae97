//! Error types returned by command handlers.
//!
//! Handlers never panic or unwind to signal failure; they return a
//! [`HandlerError`] and the dispatcher turns its display text into the
//! `message` of an error response.

use serde_json::Value;
use thiserror::Error;

/// Result type returned by every handler.
pub type HandlerResult = Result<Value, HandlerError>;

/// Failures reported by command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Parameters did not match the handler's declared shape.
    #[error("invalid params: {message}")]
    InvalidParams { message: String },

    /// A named host entity does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The request is well-formed but the host cannot honour it.
    #[error("{message}")]
    Unsupported { message: String },

    /// The handler failed while executing.
    #[error("{message}")]
    Failed { message: String },
}

impl HandlerError {
    /// Creates an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Creates a not-found error for the given entity kind.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates an unsupported-request error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Creates a generic execution failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
