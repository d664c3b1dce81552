//! Extension coordinator.
//!
//! The [`Extension`] owns the background router and the registry of open
//! tabs. Content surfaces reach the background through a link that always
//! targets the current background, so a restarted background is picked up
//! without reopening tabs.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::background::{InstallReason, MessageRouter};
use crate::completion::Completer;
use crate::delivery::{DeliveryOptions, DeliveryProtocol};
use crate::error::Result;
use crate::identifiers::TabId;
use crate::protocol::Request;
use crate::settings::{SettingsContext, SettingsStore, keys};
use crate::surface::{ContentSurface, PopupController};
use crate::transport::{Channel, LocalChannel, SurfacePool};

use super::builder::ExtensionBuilder;

// ============================================================================
// BackgroundLink
// ============================================================================

/// Channel to whichever background is currently running.
struct BackgroundLink {
    current: RwLock<LocalChannel>,
}

#[async_trait]
impl Channel for BackgroundLink {
    async fn deliver(&self, request: Request) -> Result<Option<Value>> {
        let channel = self.current.read().clone();
        channel.deliver(request).await
    }
}

// ============================================================================
// Types
// ============================================================================

/// An open tab: its surface and the channel it listens on.
struct OpenTab {
    surface: ContentSurface,
    channel: LocalChannel,
}

struct ExtensionInner {
    sync_store: Arc<dyn SettingsStore>,
    completer: Arc<dyn Completer>,
    router: MessageRouter,
    background: Arc<BackgroundLink>,
    pool: Arc<SurfacePool>,
    tabs: Mutex<FxHashMap<TabId, OpenTab>>,
    delivery_options: DeliveryOptions,
}

// ============================================================================
// Extension
// ============================================================================

/// Assembled extension: background, tabs and popup.
///
/// Cloning shares the same state.
#[derive(Clone)]
pub struct Extension {
    inner: Arc<ExtensionInner>,
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("version", &self.version())
            .field("tab_count", &self.tab_count())
            .field("background_running", &self.is_background_running())
            .finish_non_exhaustive()
    }
}

impl Extension {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ExtensionBuilder {
        ExtensionBuilder::new()
    }

    /// Wires the components and starts the background.
    pub(crate) fn new(
        sync_store: Arc<dyn SettingsStore>,
        completer: Arc<dyn Completer>,
        delivery_options: DeliveryOptions,
        version: String,
    ) -> Self {
        let router = MessageRouter::new(Arc::clone(&sync_store), Arc::clone(&completer), version);
        let background = Arc::new(BackgroundLink {
            current: RwLock::new(LocalChannel::spawn(Arc::new(router.clone()))),
        });

        info!(version = router.version(), "Background started");

        Self {
            inner: Arc::new(ExtensionInner {
                sync_store,
                completer,
                router,
                background,
                pool: Arc::new(SurfacePool::new()),
                tabs: Mutex::new(FxHashMap::default()),
                delivery_options,
            }),
        }
    }

    /// Version reported by the background.
    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        self.inner.router.version()
    }

    /// Background router.
    #[inline]
    #[must_use]
    pub fn router(&self) -> &MessageRouter {
        &self.inner.router
    }

    /// Channel to the current background.
    #[must_use]
    pub fn background(&self) -> Arc<dyn Channel> {
        self.inner.background.clone()
    }

    /// Runs the background install hook.
    pub async fn on_installed(&self, reason: InstallReason) {
        self.inner.router.on_installed(reason).await;
    }

    // ========================================================================
    // Background Lifecycle
    // ========================================================================

    /// Returns `true` while the background accepts messages.
    #[must_use]
    pub fn is_background_running(&self) -> bool {
        self.inner.background.current.read().is_open()
    }

    /// Stops the background. Tabs stay open; their sends fail until
    /// [`Extension::restart_background`].
    pub fn shutdown_background(&self) {
        self.inner.background.current.read().shutdown();
        info!("Background shut down");
    }

    /// Starts a fresh background, replacing the current one.
    pub fn restart_background(&self) {
        let channel = LocalChannel::spawn(Arc::new(self.inner.router.clone()));
        let previous = std::mem::replace(&mut *self.inner.background.current.write(), channel);
        previous.shutdown();
        info!("Background restarted");
    }

    // ========================================================================
    // Tabs
    // ========================================================================

    /// Opens a content surface in `tab_id` and loads its settings.
    ///
    /// An existing surface in the same tab is replaced.
    pub async fn open_tab(&self, tab_id: TabId) -> ContentSurface {
        let surface = ContentSurface::new(
            tab_id,
            SettingsContext::new(Arc::clone(&self.inner.sync_store), keys::CONTENT),
            DeliveryProtocol::new(self.background(), self.inner.delivery_options.clone()),
        );
        surface.init().await;

        let channel = LocalChannel::spawn(Arc::new(surface.clone()));
        self.inner.pool.insert(tab_id, Arc::new(channel.clone()));

        let previous = self.inner.tabs.lock().insert(
            tab_id,
            OpenTab {
                surface: surface.clone(),
                channel,
            },
        );
        if let Some(previous) = previous {
            debug!(%tab_id, "Replacing content surface");
            previous.channel.shutdown();
        }

        surface
    }

    /// Closes the surface in `tab_id`. Returns `false` if none was open.
    pub fn close_tab(&self, tab_id: TabId) -> bool {
        let Some(tab) = self.inner.tabs.lock().remove(&tab_id) else {
            return false;
        };
        self.inner.pool.remove(tab_id);
        tab.channel.shutdown();
        debug!(%tab_id, "Tab closed");
        true
    }

    /// Surface of `tab_id`, if open.
    #[must_use]
    pub fn tab(&self, tab_id: TabId) -> Option<ContentSurface> {
        self.inner
            .tabs
            .lock()
            .get(&tab_id)
            .map(|tab| tab.surface.clone())
    }

    /// Number of open tabs.
    #[inline]
    #[must_use]
    pub fn tab_count(&self) -> usize {
        self.inner.tabs.lock().len()
    }

    // ========================================================================
    // Popup
    // ========================================================================

    /// Creates a popup controller. Call [`PopupController::open`] next.
    #[must_use]
    pub fn popup(&self) -> PopupController {
        PopupController::new(
            Arc::clone(&self.inner.sync_store),
            Arc::clone(&self.inner.completer),
            Arc::clone(&self.inner.pool),
        )
    }

    /// Closes every tab and stops the background.
    pub fn close(&self) {
        let tabs: Vec<(TabId, OpenTab)> = self.inner.tabs.lock().drain().collect();
        info!(count = tabs.len(), "Closing all tabs");

        for (tab_id, tab) in tabs {
            self.inner.pool.remove(tab_id);
            tab.channel.shutdown();
        }
        self.shutdown_background();
    }
}

// ============================================================================
// Tests
// ============================================================================
