//! Builder pattern for extension assembly.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reply_better::{Extension, FileStore, MemoryStore};
//!
//! # async fn example() -> reply_better::Result<()> {
//! let extension = Extension::builder()
//!     .sync_store(Arc::new(FileStore::new("./settings.json")))
//!     .local_store(Arc::new(MemoryStore::new()))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::completion::{ClientOptions, Completer, CompletionClient};
use crate::delivery::DeliveryOptions;
use crate::error::{Error, Result};
use crate::settings::{MemoryStore, SettingsStore};

use super::core::Extension;

// ============================================================================
// Constants
// ============================================================================

/// Version reported in pong replies unless overridden.
pub const DEFAULT_VERSION: &str = "1.0.3";

// ============================================================================
// ExtensionBuilder
// ============================================================================

/// Builder for an [`Extension`].
///
/// Use [`Extension::builder()`] to create one. Stores default to fresh
/// in-memory stores.
#[derive(Clone)]
pub struct ExtensionBuilder {
    sync_store: Option<Arc<dyn SettingsStore>>,
    local_store: Option<Arc<dyn SettingsStore>>,
    completer: Option<Arc<dyn Completer>>,
    client_options: ClientOptions,
    delivery_options: DeliveryOptions,
    version: String,
}

impl fmt::Debug for ExtensionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionBuilder")
            .field("sync_store", &self.sync_store.is_some())
            .field("local_store", &self.local_store.is_some())
            .field("completer", &self.completer.is_some())
            .field("client_options", &self.client_options)
            .field("delivery_options", &self.delivery_options)
            .field("version", &self.version)
            .finish()
    }
}

impl Default for ExtensionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionBuilder {
    /// Creates a builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sync_store: None,
            local_store: None,
            completer: None,
            client_options: ClientOptions::new(),
            delivery_options: DeliveryOptions::new(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    /// Sets the store holding user settings.
    #[inline]
    #[must_use]
    pub fn sync_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.sync_store = Some(store);
        self
    }

    /// Sets the store holding `lastCallTime`.
    #[inline]
    #[must_use]
    pub fn local_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.local_store = Some(store);
        self
    }

    /// Replaces the HTTP completion client.
    ///
    /// Client options are ignored when a completer is set.
    #[inline]
    #[must_use]
    pub fn completer(mut self, completer: Arc<dyn Completer>) -> Self {
        self.completer = Some(completer);
        self
    }

    /// Sets the completion client options.
    #[inline]
    #[must_use]
    pub fn client_options(mut self, options: ClientOptions) -> Self {
        self.client_options = options;
        self
    }

    /// Sets the delivery protocol options.
    #[inline]
    #[must_use]
    pub fn delivery_options(mut self, options: DeliveryOptions) -> Self {
        self.delivery_options = options;
        self
    }

    /// Sets the version reported by the background.
    #[inline]
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Validates the configuration and starts the background.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if options are invalid or the version is empty
    /// - [`Error::Http`] if the HTTP client cannot be built
    pub fn build(self) -> Result<Extension> {
        self.validate()?;

        let sync_store = self
            .sync_store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let local_store = self
            .local_store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let completer: Arc<dyn Completer> = match self.completer {
            Some(completer) => completer,
            None => Arc::new(CompletionClient::with_options(
                local_store,
                self.client_options,
            )?),
        };

        Ok(Extension::new(
            sync_store,
            completer,
            self.delivery_options,
            self.version,
        ))
    }

    fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::config("Version must not be empty"));
        }
        if self.completer.is_none() {
            self.client_options.validate()?;
        }
        self.delivery_options.validate()
    }
}

// ============================================================================
// Tests
// ============================================================================
