//! Request envelope.
//!
//! # Format
//!
//! ```json
//! {
//!   "action": "improveText",
//!   "text": "hey can u send the report",
//!   "messageType": "professional",
//!   "from": "content-script",
//!   "timestamp": 1718000000000,
//!   "messageId": "550e8400-e29b-41d4-a716-446655440000"
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::MessageId;
use crate::settings::{ContentSettings, ToneSelector};

use super::epoch_millis;

// ============================================================================
// Action
// ============================================================================

/// Action tag plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    /// Liveness probe.
    #[serde(rename = "ping")]
    Ping,

    /// Rewrite `text` with the selected tone.
    #[serde(rename = "improveText")]
    ImproveText {
        /// Raw input text.
        text: String,
        /// Tone selector as sent by the surface. Blank means "use the
        /// stored default".
        #[serde(
            rename = "messageType",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        message_type: Option<String>,
    },

    /// Settings pushed from the popup to content surfaces.
    #[serde(rename = "updateSettings")]
    UpdateSettings {
        /// New content settings.
        settings: ContentSettings,
    },

    /// Any tag this build does not know.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Creates an improve action.
    #[must_use]
    pub fn improve_text(text: impl Into<String>, selector: Option<&ToneSelector>) -> Self {
        Self::ImproveText {
            text: text.into(),
            message_type: selector.map(ToString::to_string),
        }
    }

    /// Wire name of the action.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::ImproveText { .. } => "improveText",
            Self::UpdateSettings { .. } => "updateSettings",
            Self::Unknown => "unknown",
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// A message from one surface to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Log correlation id, fresh for every send.
    #[serde(rename = "messageId")]
    pub message_id: MessageId,

    /// Action and payload.
    #[serde(flatten)]
    pub action: Action,

    /// Origin label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub timestamp: u64,
}

impl Request {
    /// Creates a request with a fresh id and the current time.
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            message_id: MessageId::generate(),
            action,
            from: None,
            timestamp: epoch_millis(),
        }
    }

    /// Sets the origin label.
    #[inline]
    #[must_use]
    pub fn from_origin(mut self, origin: impl Into<String>) -> Self {
        self.from = Some(origin.into());
        self
    }

    /// Wire name of the action.
    #[inline]
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        self.action.name()
    }
}

// ============================================================================
// Tests
// ============================================================================
