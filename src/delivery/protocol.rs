//! Ping-before-resend delivery of `improveText`.
//!
//! # State Machine
//!
//! ```text
//! SendingDirect ──ok──────────────────────────────────────► done
//!      │
//!      │ timeout / channel error / malformed reply
//!      ▼
//! Pinging(1) ──fail──► Pinging(2) ──fail──► ... ──► BackgroundNotResponding
//!      │                   │
//!      └──── pong ─────────┴──► SendingAfterPing ──► done | error
//! ```
//!
//! A handled `{error}` reply terminates the protocol immediately: the
//! background is alive and said no, so there is nothing to retry.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{Action, Request, Response};
use crate::settings::ToneSelector;
use crate::transport::{Channel, send_with_timeout};

use super::options::DeliveryOptions;

// ============================================================================
// Delivery
// ============================================================================

/// What the background answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Rewritten text.
    Improved(String),
    /// Handled failure reported by the background.
    Rejected(String),
}

/// Which path produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPath {
    /// First send succeeded.
    Direct,
    /// Resent after a successful ping.
    AfterPing,
}

/// Result of a completed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Background answer.
    pub outcome: DeliveryOutcome,
    /// Path taken.
    pub path: DeliveryPath,
    /// Ping attempts made, including the successful one.
    pub ping_attempts: u32,
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SendingDirect,
    Pinging { attempt: u32 },
    SendingAfterPing { ping_attempts: u32 },
}

// ============================================================================
// DeliveryProtocol
// ============================================================================

/// Content-side sender for `improveText`.
#[derive(Clone)]
pub struct DeliveryProtocol {
    channel: Arc<dyn Channel>,
    options: DeliveryOptions,
}

impl DeliveryProtocol {
    /// Creates a protocol sending over `channel`.
    #[must_use]
    pub fn new(channel: Arc<dyn Channel>, options: DeliveryOptions) -> Self {
        Self { channel, options }
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &DeliveryOptions {
        &self.options
    }

    /// Delivers `text` for improvement.
    ///
    /// # Errors
    ///
    /// - [`Error::BackgroundNotResponding`] if every ping failed
    /// - the transport error of the resend after a successful ping
    pub async fn improve_text(
        &self,
        text: &str,
        selector: Option<&ToneSelector>,
    ) -> Result<Delivery> {
        let mut state = State::SendingDirect;

        loop {
            state = match state {
                State::SendingDirect => match self.send_improve(text, selector).await {
                    Ok(outcome) => {
                        return Ok(Delivery {
                            outcome,
                            path: DeliveryPath::Direct,
                            ping_attempts: 0,
                        });
                    }
                    Err(e) => {
                        info!(error = %e, "Direct send failed, checking background");
                        State::Pinging { attempt: 1 }
                    }
                },

                State::Pinging { attempt } if attempt > self.options.ping_retries => {
                    warn!(attempts = self.options.ping_retries, "Background not responding");
                    return Err(Error::background_not_responding(self.options.ping_retries));
                }

                State::Pinging { attempt } => {
                    if self.ping(attempt).await {
                        State::SendingAfterPing {
                            ping_attempts: attempt,
                        }
                    } else {
                        State::Pinging {
                            attempt: attempt + 1,
                        }
                    }
                }

                State::SendingAfterPing { ping_attempts } => {
                    let outcome = self.send_improve(text, selector).await?;
                    return Ok(Delivery {
                        outcome,
                        path: DeliveryPath::AfterPing,
                        ping_attempts,
                    });
                }
            };
        }
    }

    async fn send_improve(
        &self,
        text: &str,
        selector: Option<&ToneSelector>,
    ) -> Result<DeliveryOutcome> {
        let request = Request::new(Action::improve_text(text, selector))
            .from_origin(self.options.origin.as_str());
        let message_id = request.message_id.clone();

        match send_with_timeout(&self.channel, request, self.options.direct_timeout).await? {
            Response::Improved { improved_text } => Ok(DeliveryOutcome::Improved(improved_text)),
            Response::Error { error } => Ok(DeliveryOutcome::Rejected(error)),
            Response::Pong { .. } => Err(Error::malformed(format!(
                "ping reply to improve request {message_id}"
            ))),
        }
    }

    async fn ping(&self, attempt: u32) -> bool {
        let limit = self.options.ping_timeout(attempt);
        let request = Request::new(Action::Ping).from_origin(self.options.origin.as_str());

        match send_with_timeout(&self.channel, request, limit).await {
            Ok(response) if response.is_pong() => {
                debug!(attempt, "Ping answered");
                true
            }
            Ok(_) => {
                debug!(attempt, "Ping answered without pong");
                false
            }
            Err(e) => {
                debug!(attempt, error = %e, "Ping failed");
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
