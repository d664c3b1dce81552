//! Cross-context channel and its in-process implementation.
//!
//! A [`Channel`] delivers one request to a receiving surface and hands back
//! whatever the receiver answered, at most once. It has no timeout and no
//! delivery guarantee of its own; see [`super::deadline`] for that.
//!
//! # Event Loop
//!
//! [`LocalChannel`] spawns a tokio task that owns the receiving
//! [`MessageHandler`]:
//!
//! - Requests cross the boundary as JSON values, like a structured clone
//! - Each request is handled on its own task so a slow `improveText`
//!   never blocks a `ping`
//! - After [`LocalChannel::shutdown`], sends fail with
//!   [`Error::ChannelUnavailable`]

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Request, Response};

// ============================================================================
// Traits
// ============================================================================

/// Sending side of a cross-context link.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Delivers `request` and resolves with the raw reply.
    ///
    /// `Ok(None)` means the receiver handled the message without answering.
    ///
    /// # Errors
    ///
    /// [`Error::ChannelUnavailable`] if no receiver is listening.
    async fn deliver(&self, request: Request) -> Result<Option<Value>>;
}

/// Receiving side of a cross-context link.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one request. `None` sends no reply.
    async fn handle(&self, request: Request) -> Option<Response>;
}

// ============================================================================
// ChannelCommand
// ============================================================================

/// Internal commands for the event loop.
enum ChannelCommand {
    /// Deliver a serialized request and report the reply.
    Deliver {
        payload: Value,
        reply_tx: oneshot::Sender<Option<Value>>,
    },
    /// Stop receiving.
    Shutdown,
}

// ============================================================================
// LocalChannel
// ============================================================================

/// In-process channel to a spawned receiver.
///
/// Cloning shares the same receiver.
#[derive(Clone)]
pub struct LocalChannel {
    command_tx: mpsc::UnboundedSender<ChannelCommand>,
}

impl LocalChannel {
    /// Spawns the event loop for `handler`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(handler: Arc<dyn MessageHandler>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run_event_loop(handler, command_rx));
        Self { command_tx }
    }

    /// Returns `true` while the receiver is listening.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// Tears the receiver down.
    ///
    /// Requests already being handled still complete; new ones fail.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ChannelCommand::Shutdown);
    }

    async fn run_event_loop(
        handler: Arc<dyn MessageHandler>,
        mut command_rx: mpsc::UnboundedReceiver<ChannelCommand>,
    ) {
        while let Some(command) = command_rx.recv().await {
            match command {
                ChannelCommand::Deliver { payload, reply_tx } => {
                    tokio::spawn(Self::handle_delivery(
                        Arc::clone(&handler),
                        payload,
                        reply_tx,
                    ));
                }

                ChannelCommand::Shutdown => {
                    debug!("Shutdown command received");
                    break;
                }
            }
        }

        debug!("Channel event loop terminated");
    }

    async fn handle_delivery(
        handler: Arc<dyn MessageHandler>,
        payload: Value,
        reply_tx: oneshot::Sender<Option<Value>>,
    ) {
        let reply = match serde_json::from_value::<Request>(payload) {
            Ok(request) => {
                trace!(message_id = %request.message_id, action = request.action_name(), "Request received");
                handler.handle(request).await
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse incoming message");
                Some(Response::error(format!("Malformed message: {e}")))
            }
        };

        let raw = match reply.map(serde_json::to_value).transpose() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize reply");
                None
            }
        };

        if reply_tx.send(raw).is_err() {
            trace!("Sender went away before the reply");
        }
    }
}

#[async_trait]
impl Channel for LocalChannel {
    async fn deliver(&self, request: Request) -> Result<Option<Value>> {
        let payload = serde_json::to_value(&request)?;
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ChannelCommand::Deliver { payload, reply_tx })
            .map_err(|_| Error::ChannelUnavailable)?;

        reply_rx.await.map_err(|_| Error::ChannelUnavailable)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::Action;

    struct Echo;

    #[async_trait]
    impl MessageHandler for Echo {
        async fn handle(&self, request: Request) -> Option<Response> {
            match request.action {
                Action::ImproveText { text, .. } => Some(Response::improved(text)),
                Action::Ping => Some(Response::pong("test")),
                _ => None,
            }
        }
    }

    #[tokio::test]
    async fn test_deliver_returns_reply() {
        let channel = LocalChannel::spawn(Arc::new(Echo));
        let reply = channel
            .deliver(Request::new(Action::improve_text("hi", None)))
            .await
            .expect("deliver");

        assert_eq!(reply, Some(serde_json::json!({ "improvedText": "hi" })));
    }

    #[tokio::test]
    async fn test_ping_with_foreign_message_id_is_answered() {
        let channel = LocalChannel::spawn(Arc::new(Echo));
        let request: Request = serde_json::from_value(serde_json::json!({
            "action": "ping",
            "messageId": "msg_1718000000000_42",
            "timestamp": 1_718_000_000_000_u64
        }))
        .expect("parse");

        let reply = channel.deliver(request).await.expect("deliver");
        let reply = reply.expect("pong");
        assert_eq!(reply["status"], "ok");
        assert!(reply.get("error").is_none());
    }

    #[tokio::test]
    async fn test_no_reply_is_none() {
        let channel = LocalChannel::spawn(Arc::new(Echo));
        let reply = channel
            .deliver(Request::new(Action::UpdateSettings {
                settings: Default::default(),
            }))
            .await
            .expect("deliver");
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_makes_channel_unavailable() {
        let channel = LocalChannel::spawn(Arc::new(Echo));
        channel.shutdown();

        // The loop exits asynchronously; wait for it.
        while channel.is_open() {
            tokio::task::yield_now().await;
        }

        let result = channel.deliver(Request::new(Action::Ping)).await;
        assert!(matches!(result, Err(Error::ChannelUnavailable)));
    }
}
