//! Reply envelope sent from the host to the agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Success or error reply to exactly one [`crate::Command`].
///
/// Serialises as `{"status":"success","result":...}` or
/// `{"status":"error","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// The handler completed and produced a result.
    Success {
        /// Handler output.
        result: Value,
    },
    /// The command could not be executed.
    Error {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl Response {
    /// Builds a success response.
    #[must_use]
    pub const fn success(result: Value) -> Self {
        Self::Success { result }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns true for success responses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Interprets an extracted JSON document as a response envelope.
    ///
    /// # Errors
    ///
    /// Returns the deserialisation error when `status` is missing or unknown,
    /// or the variant's payload field is absent.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serialises the response into the bytes of a single wire message.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error reported by `serde_json`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Converts the envelope into a `Result`, mapping errors to their message.
    ///
    /// # Errors
    ///
    /// Returns the error message for `Response::Error`.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Self::Success { result } => Ok(result),
            Self::Error { message } => Err(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn success_wire_shape() {
        let value = serde_json::to_value(Response::success(json!({"pong": true})))
            .expect("serialise success");
        assert_eq!(value, json!({"status": "success", "result": {"pong": true}}));
    }

    #[test]
    fn error_wire_shape() {
        let value =
            serde_json::to_value(Response::error("boom")).expect("serialise error");
        assert_eq!(value, json!({"status": "error", "message": "boom"}));
    }

    #[rstest]
    #[case::unknown_status(json!({"status": "pending"}))]
    #[case::missing_message(json!({"status": "error"}))]
    #[case::missing_status(json!({"result": 1}))]
    fn rejects_malformed_envelopes(#[case] value: Value) {
        assert!(Response::from_value(value).is_err());
    }

    #[test]
    fn into_result_maps_variants() {
        assert_eq!(Response::success(json!(1)).into_result(), Ok(json!(1)));
        assert_eq!(
            Response::error("nope").into_result(),
            Err("nope".to_owned())
        );
    }
}
