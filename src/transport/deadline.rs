//! Deadline enforcement for channel sends.
//!
//! The channel gives no timeout of its own, so every send races the
//! delivery against a timer. The delivery runs on its own task and is never
//! aborted: when the timer wins, the request is closed and whatever the
//! delivery resolves with later is dropped.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::MessageId;
use crate::protocol::{Request, Response};

use super::channel::Channel;

// ============================================================================
// PendingReply
// ============================================================================

/// Completion flag shared between a caller and its delivery task.
///
/// Once closed, the delivery task must not hand its result to anyone.
#[derive(Debug, Clone, Default)]
struct PendingReply {
    closed: Arc<AtomicBool>,
}

impl PendingReply {
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

// ============================================================================
// send_with_timeout
// ============================================================================

/// Sends `request` and waits at most `limit` for a validated reply.
///
/// # Errors
///
/// - [`Error::TransportTimeout`] if the timer fires first
/// - [`Error::ChannelUnavailable`] if the receiver is gone
/// - [`Error::ProtocolMalformed`] if the reply is empty or shapeless
pub async fn send_with_timeout(
    channel: &Arc<dyn Channel>,
    request: Request,
    limit: Duration,
) -> Result<Response> {
    let message_id = request.message_id.clone();
    let timeout_ms = limit.as_millis() as u64;

    debug!(%message_id, action = request.action_name(), timeout_ms, "Sending message");

    let pending = PendingReply::default();
    let (result_tx, result_rx) = oneshot::channel();

    tokio::spawn(deliver(
        Arc::clone(channel),
        request,
        pending.clone(),
        result_tx,
    ));

    let outcome = timeout(limit, result_rx).await;
    pending.close();

    match outcome {
        Ok(Ok(Ok(reply))) => Response::from_reply(&message_id, reply),
        Ok(Ok(Err(e))) => {
            debug!(%message_id, error = %e, "Delivery failed");
            Err(e)
        }
        Ok(Err(_)) => Err(Error::ChannelUnavailable),
        Err(_) => {
            debug!(%message_id, timeout_ms, "Delivery timed out");
            Err(Error::transport_timeout(message_id, timeout_ms))
        }
    }
}

async fn deliver(
    channel: Arc<dyn Channel>,
    request: Request,
    pending: PendingReply,
    result_tx: oneshot::Sender<Result<Option<Value>>>,
) {
    let message_id: MessageId = request.message_id.clone();
    let result = channel.deliver(request).await;

    if pending.is_closed() {
        trace!(%message_id, "Discarding reply for closed request");
        return;
    }

    let _ = result_tx.send(result);
}

// ============================================================================
// Tests
// ============================================================================
