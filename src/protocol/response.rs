//! Response envelope.
//!
//! On the wire a response is exactly one of:
//!
//! ```json
//! { "improvedText": "..." }
//! { "error": "..." }
//! { "status": "ok", "version": "1.0.3", "timestamp": 1718000000000 }
//! ```
//!
//! Replies are checked once, at the message boundary, by
//! [`Response::from_reply`]. Everything past that point works with the
//! tagged [`Response`] and never re-inspects raw JSON.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::MessageId;

use super::epoch_millis;

// ============================================================================
// Constants
// ============================================================================

const IMPROVED_KEY: &str = "improvedText";
const ERROR_KEY: &str = "error";
const STATUS_KEY: &str = "status";
const STATUS_OK: &str = "ok";

// ============================================================================
// Response
// ============================================================================

/// A validated reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// Rewritten text.
    Improved {
        /// The improved message.
        #[serde(rename = "improvedText")]
        improved_text: String,
    },

    /// Handled failure reported by the receiver.
    Error {
        /// User-facing message.
        error: String,
    },

    /// Liveness probe answer.
    Pong {
        /// Always `"ok"`.
        status: String,
        /// Background version.
        version: String,
        /// Reply time, epoch milliseconds.
        timestamp: u64,
    },
}

impl Response {
    /// Creates a success reply.
    #[inline]
    #[must_use]
    pub fn improved(text: impl Into<String>) -> Self {
        Self::Improved {
            improved_text: text.into(),
        }
    }

    /// Creates an error reply.
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Creates a ping reply stamped with the current time.
    #[inline]
    #[must_use]
    pub fn pong(version: impl Into<String>) -> Self {
        Self::Pong {
            status: STATUS_OK.to_string(),
            version: version.into(),
            timestamp: epoch_millis(),
        }
    }

    /// Returns `true` for a ping reply.
    #[inline]
    #[must_use]
    pub fn is_pong(&self) -> bool {
        matches!(self, Self::Pong { .. })
    }

    /// Validates a raw reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolMalformed`] if the reply is absent, not an
    /// object, carries zero or several discriminating keys, has an empty
    /// text/error, or a status other than `"ok"`.
    pub fn from_reply(message_id: &MessageId, reply: Option<Value>) -> Result<Self> {
        let Some(reply) = reply.filter(|v| !v.is_null()) else {
            return Err(Error::malformed(format!(
                "empty response for message {message_id}"
            )));
        };

        let Value::Object(map) = reply else {
            return Err(Error::malformed(format!(
                "response for message {message_id} is not an object"
            )));
        };

        Self::from_object(&map).ok_or_else(|| {
            Error::malformed(format!(
                "response for message {message_id} has no recognised shape"
            ))
        })
    }

    fn from_object(map: &Map<String, Value>) -> Option<Self> {
        let improved = map.get(IMPROVED_KEY);
        let error = map.get(ERROR_KEY);
        let status = map.get(STATUS_KEY);

        match (improved, error, status) {
            (Some(Value::String(text)), None, None) if !text.is_empty() => {
                Some(Self::improved(text.clone()))
            }
            (None, Some(Value::String(message)), None) if !message.is_empty() => {
                Some(Self::error(message.clone()))
            }
            (None, None, Some(Value::String(status))) if status == STATUS_OK => Some(Self::Pong {
                status: status.clone(),
                version: map
                    .get("version")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                timestamp: map
                    .get("timestamp")
                    .and_then(Value::as_u64)
                    .unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn parse(value: Value) -> Result<Response> {
        Response::from_reply(&MessageId::generate(), Some(value))
    }

    #[test]
    fn test_improved_reply() {
        let response = parse(json!({ "improvedText": "Hello." })).expect("valid");
        assert_eq!(response, Response::improved("Hello."));
    }

    #[test]
    fn test_error_reply() {
        let response = parse(json!({ "error": "API key not set" })).expect("valid");
        assert_eq!(response, Response::error("API key not set"));
    }

    #[test]
    fn test_pong_reply() {
        let response =
            parse(json!({ "status": "ok", "version": "1.0.3", "timestamp": 5 })).expect("valid");
        assert!(response.is_pong());
    }

    #[test]
    fn test_bare_status_ok_is_a_pong() {
        assert!(parse(json!({ "status": "ok" })).expect("valid").is_pong());
    }

    #[test]
    fn test_absent_and_null_are_malformed() {
        let id = MessageId::generate();
        assert!(matches!(
            Response::from_reply(&id, None),
            Err(Error::ProtocolMalformed { .. })
        ));
        assert!(matches!(
            Response::from_reply(&id, Some(Value::Null)),
            Err(Error::ProtocolMalformed { .. })
        ));
    }

    #[test]
    fn test_success_and_error_together_is_malformed() {
        let result = parse(json!({ "improvedText": "a", "error": "b" }));
        assert!(matches!(result, Err(Error::ProtocolMalformed { .. })));
    }

    #[test]
    fn test_empty_text_is_malformed() {
        assert!(parse(json!({ "improvedText": "" })).is_err());
        assert!(parse(json!({ "error": "" })).is_err());
    }

    #[test]
    fn test_wrong_status_is_malformed() {
        assert!(parse(json!({ "status": "busy" })).is_err());
        assert!(parse(json!({})).is_err());
        assert!(parse(json!("ok")).is_err());
    }

    #[test]
    fn test_serialized_shapes() {
        assert_eq!(
            serde_json::to_value(Response::improved("x")).expect("serialize"),
            json!({ "improvedText": "x" })
        );
        assert_eq!(
            serde_json::to_value(Response::error("y")).expect("serialize"),
            json!({ "error": "y" })
        );
        let pong = serde_json::to_value(Response::pong("1.0.3")).expect("serialize");
        assert_eq!(pong["status"], "ok");
        assert_eq!(pong["version"], "1.0.3");
    }

    #[test]
    fn test_validated_round_trip() {
        for response in [Response::improved("x"), Response::error("y"), Response::pong("v")] {
            let raw = serde_json::to_value(&response).expect("serialize");
            assert_eq!(parse(raw).expect("valid"), response);
        }
    }
}
