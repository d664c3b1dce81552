//! Registry of live content surfaces.
//!
//! The popup reaches every open tab through the pool. Delivery is
//! best-effort: a tab whose content surface is gone is logged and skipped.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             SurfacePool                 │
//! │  ┌─────────────────────────────────┐    │
//! │  │ TabId=1 → Channel 1             │    │
//! │  │ TabId=2 → Channel 2             │    │
//! │  │ TabId=3 → Channel 3             │    │
//! │  └─────────────────────────────────┘    │
//! └─────────────────────────────────────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::identifiers::TabId;
use crate::protocol::{Action, Request};

use super::channel::Channel;

// ============================================================================
// BroadcastSummary
// ============================================================================

/// Result of a best-effort broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastSummary {
    /// Tabs that accepted the message.
    pub delivered: usize,
    /// Tabs that could not be reached.
    pub failed: usize,
}

// ============================================================================
// SurfacePool
// ============================================================================

/// Live content surfaces keyed by tab.
#[derive(Default)]
pub struct SurfacePool {
    surfaces: RwLock<FxHashMap<TabId, Arc<dyn Channel>>>,
}

impl SurfacePool {
    /// Creates an empty pool.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the surface of `tab_id`, replacing any previous one.
    pub fn insert(&self, tab_id: TabId, channel: Arc<dyn Channel>) {
        self.surfaces.write().insert(tab_id, channel);
        debug!(%tab_id, "Surface registered");
    }

    /// Removes the surface of `tab_id`.
    pub fn remove(&self, tab_id: TabId) -> Option<Arc<dyn Channel>> {
        let removed = self.surfaces.write().remove(&tab_id);
        if removed.is_some() {
            debug!(%tab_id, "Surface removed");
        }
        removed
    }

    /// Number of registered surfaces.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.read().len()
    }

    /// Returns `true` if no surface is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.read().is_empty()
    }

    /// Registered tab ids.
    #[must_use]
    pub fn tab_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<_> = self.surfaces.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sends `action` to every registered surface concurrently.
    ///
    /// Each tab gets its own request (fresh message id). Failures are
    /// logged and counted, never returned.
    pub async fn broadcast(&self, action: Action, origin: &str) -> BroadcastSummary {
        // Snapshot so the lock is not held across awaits.
        let targets: Vec<_> = self
            .surfaces
            .read()
            .iter()
            .map(|(tab_id, channel)| (*tab_id, Arc::clone(channel)))
            .collect();

        let sends = targets.into_iter().map(|(tab_id, channel)| {
            let request = Request::new(action.clone()).from_origin(origin);
            async move { (tab_id, channel.deliver(request).await) }
        });

        let mut summary = BroadcastSummary::default();
        for (tab_id, result) in join_all(sends).await {
            match result {
                Ok(_) => summary.delivered += 1,
                Err(e) => {
                    // Content surface may not be loaded in this tab.
                    info!(%tab_id, error = %e, "Could not update settings for tab");
                    summary.failed += 1;
                }
            }
        }

        debug!(
            action = action.name(),
            delivered = summary.delivered,
            failed = summary.failed,
            "Broadcast finished"
        );
        summary
    }
}

// ============================================================================
// Tests
// ============================================================================
