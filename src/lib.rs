//! Reply Better - AI-assisted text improvement, extension core.
//!
//! This library models the three surfaces of a text-improvement browser
//! extension as async components connected by a cross-context message
//! channel.
//!
//! # Architecture
//!
//! - **Content surface**: inline improve trigger and snippet expansion, one
//!   per tab
//! - **Background**: routes messages and calls the completion provider
//! - **Popup**: settings, saved prompts and snippets
//!
//! Key design principles:
//!
//! - Content → background sends use ping-before-resend with per-send
//!   timeouts ([`delivery`])
//! - Replies are validated once into [`Response`]
//! - Each surface caches settings in an explicit [`SettingsContext`]
//! - Popup changes are broadcast best-effort to every open tab
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use reply_better::{Extension, FileStore, Result, TabId, TriggerOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let extension = Extension::builder()
//!         .sync_store(Arc::new(FileStore::new("./sync.json")))
//!         .build()?;
//!
//!     let popup = extension.popup();
//!     popup.open().await?;
//!     popup.first_time_setup("sk-or-...", "meta-llama/llama-3-8b-instruct").await?;
//!
//!     if let Some(tab_id) = TabId::new(1) {
//!         let tab = extension.open_tab(tab_id).await;
//!         match tab.improve("hey can u send the report").await {
//!             TriggerOutcome::Replaced(text) => println!("{text}"),
//!             TriggerOutcome::Alert(notice) => eprintln!("{notice}"),
//!             TriggerOutcome::Skipped => {}
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`background`] | Message router |
//! | [`completion`] | Provider HTTP client |
//! | [`delivery`] | Content-side delivery protocol |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`extension`] | Assembly and lifecycle |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Cross-context message types |
//! | [`settings`] | Settings model, tones and stores |
//! | [`surface`] | Content surface and popup controller |
//! | [`transport`] | Channels, deadlines and the surface pool |

// ============================================================================
// Modules
// ============================================================================

/// Background message router.
pub mod background;

/// Completion provider client.
pub mod completion;

/// Ping-before-resend delivery of improve requests.
pub mod delivery;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Extension assembly.
///
/// Use [`Extension::builder()`] to create a configured instance.
pub mod extension;

/// Type-safe identifiers.
pub mod identifiers;

/// Cross-context message types.
pub mod protocol;

/// Settings model, tone selection and stores.
pub mod settings;

/// Content surface and popup controller.
pub mod surface;

/// Cross-context transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Background
pub use background::{InstallReason, MessageRouter};

// Completion
pub use completion::{ClientOptions, Completer, CompletionClient};

// Delivery
pub use delivery::{
    Delivery, DeliveryOptions, DeliveryOutcome, DeliveryPath, DeliveryProtocol, Notice,
};

// Error types
pub use error::{Error, Result};

// Extension
pub use extension::{Extension, ExtensionBuilder};

// Identifier types
pub use identifiers::{MessageId, TabId};

// Protocol types
pub use protocol::{Action, Request, Response};

// Settings
pub use settings::{
    ContentSettings, FileStore, MemoryStore, SavedPrompt, Settings, SettingsContext,
    SettingsStore, Snippet, Tone, ToneSelector,
};

// Surfaces
pub use surface::{
    ContentSurface, DispatchOutcome, Expansion, PopupAction, PopupController, PopupMode,
    PopupView, SettingsForm, TriggerOutcome,
};

// Transport
pub use transport::{BroadcastSummary, Channel, LocalChannel, MessageHandler, SurfacePool};
