//! Text-improvement provider client.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Completer`] | Seam used by the router and popup |
//! | [`CompletionClient`] | reqwest-backed implementation |
//! | [`ClientOptions`] | Endpoint, interval and header configuration |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Chat-completion wire types.
mod api;

/// reqwest-backed client.
pub mod client;

/// Client configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::CompletionClient;
pub use options::ClientOptions;

// ============================================================================
// Completer
// ============================================================================

/// Something that can rewrite text and check credentials.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Rewrites `text` under `system_prompt` with `model`.
    async fn improve(
        &self,
        text: &str,
        credential: &str,
        model: &str,
        system_prompt: &str,
    ) -> Result<String>;

    /// Returns `true` if the provider accepts `credential`.
    async fn validate_credential(&self, credential: &str) -> bool;
}
