//! Extension assembly.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Extension`] | Background, open tabs and popup factory |
//! | [`ExtensionBuilder`] | Fluent configuration builder |
//!
//! # Example
//!
//! ```no_run
//! use reply_better::{Extension, TabId, TriggerOutcome};
//!
//! # async fn example() -> reply_better::Result<()> {
//! let extension = Extension::builder().build()?;
//!
//! let popup = extension.popup();
//! popup.open().await?;
//! popup.first_time_setup("sk-or-...", "meta-llama/llama-3-8b-instruct").await?;
//!
//! if let Some(tab_id) = TabId::new(1) {
//!     let tab = extension.open_tab(tab_id).await;
//!     if let TriggerOutcome::Replaced(text) = tab.improve("hey can u send it").await {
//!         println!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder.
pub mod builder;

/// Extension coordinator.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ExtensionBuilder;
pub use core::Extension;
