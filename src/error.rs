//! Error types for Reply Better.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use reply_better::{Error, Result};
//!
//! async fn example(client: &CompletionClient) -> Result<()> {
//!     let text = client.improve("hi", "sk-or-...", "model", "prompt").await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::ConfigMissing`], [`Error::InvalidArgument`] |
//! | Client | [`Error::RateLimited`] |
//! | Delivery | [`Error::TransportTimeout`], [`Error::ChannelUnavailable`], [`Error::BackgroundNotResponding`] |
//! | Protocol | [`Error::ProtocolMalformed`], [`Error::UnknownAction`] |
//! | Upstream | [`Error::UpstreamHttp`], [`Error::UpstreamShape`] |
//! | External | [`Error::Store`], [`Error::Io`], [`Error::Json`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::MessageId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Display strings are what ends up inside `{error}` response envelopes,
/// so they are phrased for the end user.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid options or builder configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A required setting (the API credential) is not configured.
    #[error("{message}")]
    ConfigMissing {
        /// User-facing description of what is missing.
        message: String,
    },

    /// Form input rejected before any work was done.
    #[error("{message}")]
    InvalidArgument {
        /// User-facing validation message.
        message: String,
    },

    // ========================================================================
    // Client Errors
    // ========================================================================
    /// A completion call was attempted inside the minimum interval.
    #[error("Please wait a moment before making another request.")]
    RateLimited {
        /// Milliseconds until the next call is allowed.
        retry_after_ms: u64,
    },

    // ========================================================================
    // Delivery Errors
    // ========================================================================
    /// No reply arrived before the deadline.
    #[error("Message {message_id} timed out after {timeout_ms}ms")]
    TransportTimeout {
        /// The message that timed out.
        message_id: MessageId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The receiving context is not present or was torn down.
    #[error("Could not establish connection. Receiving end does not exist.")]
    ChannelUnavailable,

    /// Every liveness probe failed.
    #[error("Background script not responding to ping after {attempts} attempts")]
    BackgroundNotResponding {
        /// Number of ping attempts made.
        attempts: u32,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Empty or shapeless reply.
    #[error("Empty or invalid response received: {message}")]
    ProtocolMalformed {
        /// What was wrong with the reply.
        message: String,
    },

    /// Unrecognised action tag.
    #[error("Unknown message type")]
    UnknownAction,

    // ========================================================================
    // Upstream Errors
    // ========================================================================
    /// Non-2xx status from the completion API.
    #[error("{message}")]
    UpstreamHttp {
        /// HTTP status code.
        status: u16,
        /// Parsed provider message, or `Error: <status>`.
        message: String,
    },

    /// 2xx status but the body did not have the expected shape.
    #[error("Unexpected completion response: {message}")]
    UpstreamShape {
        /// Description of the mismatch.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// Settings store backend failure.
    #[error("Storage error: {message}")]
    Store {
        /// Description of the storage failure.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates the "API key not set" error.
    #[inline]
    pub fn credential_missing() -> Self {
        Self::ConfigMissing {
            message: "API key not set. Please set up the extension first.".to_string(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a rate limited error.
    #[inline]
    pub fn rate_limited(retry_after_ms: u64) -> Self {
        Self::RateLimited { retry_after_ms }
    }

    /// Creates a transport timeout error.
    #[inline]
    pub fn transport_timeout(message_id: MessageId, timeout_ms: u64) -> Self {
        Self::TransportTimeout {
            message_id,
            timeout_ms,
        }
    }

    /// Creates a background not responding error.
    #[inline]
    pub fn background_not_responding(attempts: u32) -> Self {
        Self::BackgroundNotResponding { attempts }
    }

    /// Creates a malformed protocol error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::ProtocolMalformed {
            message: message.into(),
        }
    }

    /// Creates an upstream HTTP error.
    #[inline]
    pub fn upstream_http(status: u16, message: impl Into<String>) -> Self {
        Self::UpstreamHttp {
            status,
            message: message.into(),
        }
    }

    /// Creates an upstream shape error.
    #[inline]
    pub fn upstream_shape(message: impl Into<String>) -> Self {
        Self::UpstreamShape {
            message: message.into(),
        }
    }

    /// Creates a store error.
    #[inline]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a delivery timeout.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TransportTimeout { .. })
    }

    /// Returns `true` if the receiving context is gone.
    #[inline]
    #[must_use]
    pub fn is_channel_unavailable(&self) -> bool {
        matches!(self, Self::ChannelUnavailable)
    }

    /// Returns `true` if this is a cross-context transport failure.
    ///
    /// These are the failures that send the delivery protocol into its
    /// ping fallback.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::TransportTimeout { .. }
                | Self::ChannelUnavailable
                | Self::ProtocolMalformed { .. }
                | Self::Json(_)
        )
    }

    /// Returns `true` if the failure came from the completion provider.
    #[inline]
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            Self::UpstreamHttp { .. } | Self::UpstreamShape { .. } | Self::Http(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_credential_missing_display() {
        let err = Error::credential_missing();
        assert!(err.to_string().starts_with("API key not set"));
    }

    #[test]
    fn test_timeout_display() {
        let id = MessageId::generate();
        let err = Error::transport_timeout(id.clone(), 60_000);
        assert_eq!(
            err.to_string(),
            format!("Message {id} timed out after 60000ms")
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_upstream_http_display_is_message() {
        let err = Error::upstream_http(401, "No auth credentials found");
        assert_eq!(err.to_string(), "No auth credentials found");
        assert!(err.is_upstream_error());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::ChannelUnavailable.is_transport_error());
        assert!(Error::malformed("empty").is_transport_error());
        assert!(!Error::rate_limited(10).is_transport_error());
        assert!(!Error::credential_missing().is_transport_error());
    }

    #[test]
    fn test_channel_unavailable_mentions_receiving_end() {
        assert!(
            Error::ChannelUnavailable
                .to_string()
                .contains("Receiving end does not exist")
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
