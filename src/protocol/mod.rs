//! Cross-context message types.
//!
//! This module defines the envelopes exchanged between extension surfaces
//! (content script, background, popup).
//!
//! # Protocol Overview
//!
//! | Action | Direction | Reply |
//! |--------|-----------|-------|
//! | `ping` | Content → Background | `{status, version, timestamp}` |
//! | `improveText` | Content → Background | `{improvedText}` or `{error}` |
//! | `updateSettings` | Popup → Content | none |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `request` | Request envelope and action tags |
//! | `response` | Validated response union |

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// Submodules
// ============================================================================

/// Request envelope and action tags.
pub mod request;

/// Response envelope.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use request::{Action, Request};
pub use response::Response;

// ============================================================================
// Helpers
// ============================================================================

/// Current time in epoch milliseconds.
#[must_use]
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
