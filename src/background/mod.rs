//! Background surface.
//!
//! Owns the message router: the only surface that talks to the completion
//! provider on behalf of content surfaces.

// ============================================================================
// Submodules
// ============================================================================

/// Action dispatch.
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use router::{InstallReason, MessageRouter};
