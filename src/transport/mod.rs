//! Cross-context transport layer.
//!
//! This module carries messages between extension surfaces.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │ Content surface │        LocalChannel          │   Background    │
//! │                 │─────────────────────────────►│                 │
//! │ send_with_      │   request (JSON value)       │  MessageRouter  │
//! │ timeout         │◄─────────────────────────────│                 │
//! │                 │   reply (JSON value | none)  │                 │
//! └─────────────────┘                              └─────────────────┘
//!         ▲
//!         │ updateSettings (SurfacePool::broadcast)
//! ┌───────┴─────────┐
//! │      Popup      │
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Channel/handler traits and in-process event loop |
//! | `deadline` | Timeout racing with late-reply discard |
//! | `pool` | Registry of live content surfaces |

// ============================================================================
// Submodules
// ============================================================================

/// Channel and handler traits, in-process channel.
pub mod channel;

/// Deadline enforcement for sends.
pub mod deadline;

/// Registry of live content surfaces.
pub mod pool;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{Channel, LocalChannel, MessageHandler};
pub use deadline::send_with_timeout;
pub use pool::{BroadcastSummary, SurfacePool};
