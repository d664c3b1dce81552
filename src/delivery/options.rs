//! Delivery protocol configuration.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for an `improveText` send.
pub const DEFAULT_DIRECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Ping attempts after a failed direct send.
pub const DEFAULT_PING_RETRIES: u32 = 3;

/// Timeout of the first ping; attempt `n` waits `n` times this.
pub const DEFAULT_PING_BASE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Origin label stamped on content requests.
pub const DEFAULT_ORIGIN: &str = "content-script";

// ============================================================================
// DeliveryOptions
// ============================================================================

/// Timeouts and retry budget of the delivery protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Timeout for each `improveText` send.
    pub direct_timeout: Duration,

    /// Maximum ping attempts.
    pub ping_retries: u32,

    /// Timeout of the first ping.
    pub ping_base_timeout: Duration,

    /// `from` label of outgoing requests.
    pub origin: String,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryOptions {
    /// Creates options with the default budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            direct_timeout: DEFAULT_DIRECT_TIMEOUT,
            ping_retries: DEFAULT_PING_RETRIES,
            ping_base_timeout: DEFAULT_PING_BASE_TIMEOUT,
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }

    /// Sets the `improveText` timeout.
    #[inline]
    #[must_use]
    pub fn with_direct_timeout(mut self, timeout: Duration) -> Self {
        self.direct_timeout = timeout;
        self
    }

    /// Sets the ping attempt budget.
    #[inline]
    #[must_use]
    pub fn with_ping_retries(mut self, retries: u32) -> Self {
        self.ping_retries = retries;
        self
    }

    /// Sets the first ping timeout.
    #[inline]
    #[must_use]
    pub fn with_ping_base_timeout(mut self, timeout: Duration) -> Self {
        self.ping_base_timeout = timeout;
        self
    }

    /// Sets the origin label.
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Timeout of ping attempt `attempt` (1-based).
    #[inline]
    #[must_use]
    pub fn ping_timeout(&self, attempt: u32) -> Duration {
        self.ping_base_timeout.saturating_mul(attempt)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on a zero timeout or an empty ping budget.
    pub fn validate(&self) -> Result<()> {
        if self.direct_timeout.is_zero() {
            return Err(Error::config("Direct timeout must be greater than zero"));
        }
        if self.ping_base_timeout.is_zero() {
            return Err(Error::config("Ping timeout must be greater than zero"));
        }
        if self.ping_retries == 0 {
            return Err(Error::config("At least one ping attempt is required"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
