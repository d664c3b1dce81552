//! User-facing surfaces.
//!
//! | Surface | Description |
//! |---------|-------------|
//! | [`ContentSurface`] | Per-tab inline trigger and snippet expansion |
//! | [`PopupController`] | Settings, prompts, snippets and broadcast |

// ============================================================================
// Submodules
// ============================================================================

/// Per-tab content surface.
pub mod content;

/// Popup controller.
pub mod popup;

// ============================================================================
// Re-exports
// ============================================================================

pub use content::{ContentSurface, Expansion, TriggerOutcome};
pub use popup::{
    DispatchOutcome, PopupAction, PopupController, PopupMode, PopupView, SettingsForm,
};
