//! Type-safe identifiers.
//!
//! Newtype wrappers keep message ids and tab ids from being mixed up.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// MessageId
// ============================================================================

/// Identifier attached to every outbound message.
///
/// Used only to correlate log output between surfaces; protocol
/// correctness never depends on it. Peers may send any string, so the
/// id is opaque on the way in. Generated ids look like `msg_<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generates a fresh random id.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("msg_{}", Uuid::new_v4().simple()))
    }

    /// Returns the id as sent on the wire.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TabId
// ============================================================================

/// Browser tab hosting a content surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(u32);

impl TabId {
    /// Creates a tab id. Tab ids are positive; zero is rejected.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique() {
        let a = MessageId::generate();
        let b = MessageId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_message_id_display() {
        let id = MessageId::generate();
        let shown = id.to_string();
        assert!(shown.starts_with("msg_"));
        assert_eq!(shown.len(), 4 + 32);
    }

    #[test]
    fn test_message_id_display_matches_wire_form() {
        let id = MessageId::generate();
        let json = serde_json::to_value(&id).expect("serialize");
        assert_eq!(json, serde_json::Value::String(id.to_string()));
        assert_eq!(id.as_str(), id.to_string());
    }

    #[test]
    fn test_foreign_message_id_is_accepted() {
        let id: MessageId =
            serde_json::from_value(serde_json::json!("msg_1718000000000_42")).expect("deserialize");
        assert_eq!(id, MessageId::from("msg_1718000000000_42"));
        assert_eq!(id.to_string(), "msg_1718000000000_42");
    }

    #[test]
    fn test_tab_id_rejects_zero() {
        assert!(TabId::new(0).is_none());
        assert_eq!(TabId::new(7).map(|t| t.as_u32()), Some(7));
    }
}
