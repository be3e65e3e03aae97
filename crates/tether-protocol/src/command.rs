//! Request envelope sent from the agent to the host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keyword-style parameters attached to a command.
pub type CommandParams = Map<String, Value>;

/// A typed request: a command type plus its parameters.
///
/// Serialises as `{"type": "...", "params": {...}}`. A missing `params` field
/// deserialises to an empty object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command type used to select the handler.
    #[serde(rename = "type")]
    pub kind: String,
    /// Parameters forwarded to the handler.
    #[serde(default)]
    pub params: CommandParams,
}

impl Command {
    /// Builds a command with the given parameters.
    #[must_use]
    pub fn new(kind: impl Into<String>, params: CommandParams) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// Builds a command with no parameters.
    #[must_use]
    pub fn bare(kind: impl Into<String>) -> Self {
        Self::new(kind, CommandParams::new())
    }

    /// Interprets an extracted JSON document as a command envelope.
    ///
    /// # Errors
    ///
    /// Returns the deserialisation error when the document is not an object
    /// with a string `type` and an object `params`.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serialises the command into the bytes of a single wire message.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error reported by `serde_json`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
