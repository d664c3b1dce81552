//! Settings model, stores and per-surface cache.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `model` | Settings snapshot, saved prompts, snippets |
//! | `tone` | Tone presets and system prompt resolution |
//! | `store` | Key-value store trait and implementations |
//! | `context` | Cached snapshot owned by one surface |

// ============================================================================
// Submodules
// ============================================================================

/// Cached snapshot owned by one surface.
pub mod context;

/// Settings snapshot types.
pub mod model;

/// Key-value stores.
pub mod store;

/// Tone presets and prompt resolution.
pub mod tone;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::SettingsContext;
pub use model::{ContentSettings, DEFAULT_MODEL, SavedPrompt, Settings, Snippet, keys};
pub use store::{Entries, FileStore, MemoryStore, SettingsStore};
pub use tone::{CUSTOM_PROMPT_PREFIX, NO_COMMENTARY_SUFFIX, Tone, ToneSelector};
