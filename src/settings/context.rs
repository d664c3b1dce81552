//! Per-surface settings cache.
//!
//! Each surface owns one [`SettingsContext`]: a cached copy of (part of)
//! the settings, refreshed from the store by [`SettingsContext::reload`] and
//! replaced wholesale when a broadcast update arrives. The store stays the
//! source of truth; the cache may be stale.
//!
//! A reload never overwrites an [`apply`](SettingsContext::apply) or
//! [`update`](SettingsContext::update) that landed while the store read was
//! in flight: every local write bumps a generation, and a reload only
//! commits if the generation it started from is still current.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Result;

use super::store::{self, SettingsStore};

// ============================================================================
// SettingsContext
// ============================================================================

/// Cached value plus the number of local writes it has seen.
struct Cached<T> {
    value: T,
    generation: u64,
}

/// Cached settings snapshot for one surface.
pub struct SettingsContext<T> {
    store: Arc<dyn SettingsStore>,
    keys: &'static [&'static str],
    current: Arc<RwLock<Cached<T>>>,
}

impl<T> Clone for SettingsContext<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys,
            current: Arc::clone(&self.current),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SettingsContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsContext")
            .field("keys", &self.keys)
            .field("current", &self.current.read().value)
            .finish_non_exhaustive()
    }
}

impl<T> SettingsContext<T>
where
    T: Clone + Default + DeserializeOwned + Send + Sync,
{
    /// Creates a context holding defaults until the first reload.
    #[must_use]
    pub fn new(store: Arc<dyn SettingsStore>, keys: &'static [&'static str]) -> Self {
        Self {
            store,
            keys,
            current: Arc::new(RwLock::new(Cached {
                value: T::default(),
                generation: 0,
            })),
        }
    }

    /// Re-reads the snapshot from the store.
    ///
    /// On failure the cached value is left untouched. If a local write
    /// happened during the read, the stale result is dropped.
    ///
    /// # Errors
    ///
    /// Propagates store and deserialization failures.
    pub async fn reload(&self) -> Result<()> {
        let started = self.current.read().generation;
        let fresh: T = store::load(self.store.as_ref(), self.keys).await?;

        let mut cached = self.current.write();
        if cached.generation != started {
            debug!("Settings changed during reload, keeping newer value");
            return Ok(());
        }
        cached.value = fresh;
        debug!(keys = self.keys.len(), "Settings context reloaded");
        Ok(())
    }

    /// Replaces the cached snapshot in one step.
    pub fn apply(&self, value: T) {
        let mut cached = self.current.write();
        cached.value = value;
        cached.generation += 1;
    }

    /// Returns a copy of the cached snapshot.
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.current.read().value.clone()
    }

    /// Reads the cached snapshot without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.current.read().value)
    }

    /// Mutates the cached snapshot. Does not write to the store.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut cached = self.current.write();
        cached.generation += 1;
        f(&mut cached.value)
    }

    /// The store this context reads from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }
}

// ============================================================================
// Tests
// ============================================================================
