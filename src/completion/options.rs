//! Completion client configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use reply_better::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_base_url("http://127.0.0.1:8080/api/v1")
//!     .with_min_interval(Duration::from_millis(500));
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Provider API root.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/";

/// Minimum time between two completion calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// HTTP-level timeout for one completion call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const DEFAULT_REFERER: &str = "https://reply-better-ai.extension";
const DEFAULT_TITLE: &str = "Reply Better AI";

// ============================================================================
// ClientOptions
// ============================================================================

/// Completion client options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// API root; endpoint paths are joined onto it.
    pub base_url: String,

    /// Minimum interval between completion calls.
    pub min_interval: Duration,

    /// HTTP request timeout.
    pub request_timeout: Duration,

    /// `HTTP-Referer` attribution header.
    pub referer: String,

    /// `X-Title` attribution header.
    pub title: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientOptions {
    /// Creates options with the provider defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Sets the API root.
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the minimum interval between calls.
    #[inline]
    #[must_use]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Sets the HTTP request timeout.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the attribution headers.
    #[inline]
    #[must_use]
    pub fn with_attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }

    /// Parses the base URL, adding the trailing slash `Url::join` needs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is invalid or not http(s).
    pub fn base(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let url = Url::parse(&raw)
            .map_err(|e| Error::config(format!("Invalid base URL {raw:?}: {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::config(format!(
                "Base URL must be http or https, got {other}"
            ))),
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on an invalid URL or a zero request timeout.
    pub fn validate(&self) -> Result<()> {
        self.base()?;
        if self.request_timeout.is_zero() {
            return Err(Error::config("Request timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
