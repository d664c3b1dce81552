//! Content-side message delivery.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `protocol` | Direct send with ping fallback |
//! | `options` | Timeouts and retry budget |
//! | `notice` | User-facing alert classification |

// ============================================================================
// Submodules
// ============================================================================

/// User-facing alert classification.
pub mod notice;

/// Timeouts and retry budget.
pub mod options;

/// Direct send with ping fallback.
pub mod protocol;

// ============================================================================
// Re-exports
// ============================================================================

pub use notice::Notice;
pub use options::DeliveryOptions;
pub use protocol::{Delivery, DeliveryOutcome, DeliveryPath, DeliveryProtocol};
