//! Background message router.
//!
//! Dispatches on the action tag and always produces exactly one response.
//!
//! | Action | Handling |
//! |--------|----------|
//! | `ping` | Pong, no I/O |
//! | `improveText` | Settings lookup, prompt resolution, completion |
//! | anything else | `{error: "Unknown message type"}` |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::completion::Completer;
use crate::error::Error;
use crate::protocol::{Action, Request, Response};
use crate::settings::store::{self, SettingsStore};
use crate::settings::{DEFAULT_MODEL, Settings, ToneSelector, keys};
use crate::transport::MessageHandler;

// ============================================================================
// Constants
// ============================================================================

const SETTINGS_LOAD_FAILED: &str = "Failed to load settings";

// ============================================================================
// InstallReason
// ============================================================================

/// Why the install hook fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    /// First installation.
    Install,
    /// Version update.
    Update,
}

// ============================================================================
// MessageRouter
// ============================================================================

/// Handles requests arriving at the background surface.
#[derive(Clone)]
pub struct MessageRouter {
    store: Arc<dyn SettingsStore>,
    completer: Arc<dyn Completer>,
    version: String,
}

impl MessageRouter {
    /// Creates a router reading settings from `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn SettingsStore>,
        completer: Arc<dyn Completer>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            completer,
            version: version.into(),
        }
    }

    /// Version reported in pong replies.
    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Handles one request. Never fails.
    pub async fn dispatch(&self, request: Request) -> Response {
        debug!(
            message_id = %request.message_id,
            action = request.action_name(),
            from = request.from.as_deref().unwrap_or("unknown"),
            "Dispatching request"
        );

        match request.action {
            Action::Ping => Response::pong(self.version.as_str()),

            Action::ImproveText { text, message_type } => {
                self.improve_text(&text, message_type.as_deref()).await
            }

            Action::UpdateSettings { .. } | Action::Unknown => {
                warn!(message_id = %request.message_id, "Unknown message type");
                Response::error(Error::UnknownAction.to_string())
            }
        }
    }

    async fn improve_text(&self, text: &str, message_type: Option<&str>) -> Response {
        let settings: Settings = match store::load(self.store.as_ref(), keys::IMPROVE).await {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "Error loading settings");
                return Response::error(SETTINGS_LOAD_FAILED);
            }
        };

        let Some(credential) = settings.credential() else {
            return Response::error(Error::credential_missing().to_string());
        };

        let selector = message_type
            .filter(|value| !value.is_empty())
            .map_or_else(|| settings.message_type.clone(), ToneSelector::parse);
        let system_prompt = selector.system_prompt(&settings.saved_prompts);
        let model = if settings.model.is_empty() {
            DEFAULT_MODEL
        } else {
            settings.model.as_str()
        };

        debug!(%selector, model, "Improving text");

        match self
            .completer
            .improve(text, credential, model, &system_prompt)
            .await
        {
            Ok(improved) => Response::improved(improved),
            Err(e) => {
                warn!(error = %e, "Improve request failed");
                Response::error(e.to_string())
            }
        }
    }

    /// Runs the install hook.
    ///
    /// On first install without a stored credential, writes the default
    /// model and tone.
    pub async fn on_installed(&self, reason: InstallReason) {
        match reason {
            InstallReason::Install => {
                let settings: Settings =
                    match store::load(self.store.as_ref(), &[keys::API_KEY]).await {
                        Ok(settings) => settings,
                        Err(e) => {
                            error!(error = %e, "Error reading settings on install");
                            return;
                        }
                    };

                if settings.credential().is_some() {
                    return;
                }

                let mut defaults = store::Entries::new();
                defaults.insert(keys::MODEL.to_string(), DEFAULT_MODEL.into());
                defaults.insert(
                    keys::MESSAGE_TYPE.to_string(),
                    ToneSelector::default().to_string().into(),
                );

                match self.store.set(defaults).await {
                    Ok(()) => info!("Default settings written"),
                    Err(e) => error!(error = %e, "Error writing default settings"),
                }
            }
            InstallReason::Update => {
                info!(version = %self.version, "Extension updated");
            }
        }
    }
}

#[async_trait]
impl MessageHandler for MessageRouter {
    async fn handle(&self, request: Request) -> Option<Response> {
        Some(self.dispatch(request).await)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::error::Result;
    use crate::settings::{Entries, MemoryStore, NO_COMMENTARY_SUFFIX, Tone};

    /// Records every call and answers with a fixed result.
    #[derive(Default)]
    struct FakeCompleter {
        calls: AtomicUsize,
        last: Mutex<Option<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Completer for FakeCompleter {
        async fn improve(
            &self,
            text: &str,
            _credential: &str,
            model: &str,
            system_prompt: &str,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = Some((text.into(), model.into(), system_prompt.into()));
            if self.fail {
                Err(Error::upstream_http(401, "No auth credentials found"))
            } else {
                Ok(format!("improved: {text}"))
            }
        }

        async fn validate_credential(&self, _credential: &str) -> bool {
            true
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SettingsStore for FailingStore {
        async fn get(&self, _keys: &[&str]) -> Result<Entries> {
            Err(Error::store("unavailable"))
        }

        async fn set(&self, _entries: Entries) -> Result<()> {
            Err(Error::store("unavailable"))
        }
    }

    fn store_with(value: serde_json::Value) -> Arc<MemoryStore> {
        match value {
            serde_json::Value::Object(entries) => Arc::new(MemoryStore::with_entries(entries)),
            _ => Arc::new(MemoryStore::new()),
        }
    }

    fn improve(text: &str, message_type: Option<&str>) -> Request {
        Request::new(Action::ImproveText {
            text: text.into(),
            message_type: message_type.map(Into::into),
        })
    }

    #[tokio::test]
    async fn test_ping_does_no_io() {
        let completer = Arc::new(FakeCompleter::default());
        let router = MessageRouter::new(Arc::new(FailingStore), completer.clone(), "1.0.3");

        let response = router.dispatch(Request::new(Action::Ping)).await;
        assert!(response.is_pong());
        assert!(matches!(response, Response::Pong { ref version, .. } if version == "1.0.3"));
        assert_eq!(completer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ping_with_foreign_message_id() {
        let router = MessageRouter::new(
            Arc::new(FailingStore),
            Arc::new(FakeCompleter::default()),
            "1.0.3",
        );
        let request: Request = serde_json::from_value(json!({
            "action": "ping",
            "messageId": "msg_1718000000000_42",
            "from": "content-script"
        }))
        .expect("parse");

        assert!(router.dispatch(request).await.is_pong());
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let completer = Arc::new(FakeCompleter::default());
        let router = MessageRouter::new(Arc::new(MemoryStore::new()), completer.clone(), "1");

        let response = router.dispatch(improve("hi", None)).await;
        assert_eq!(
            response,
            Response::error("API key not set. Please set up the extension first.")
        );
        assert_eq!(completer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure() {
        let router = MessageRouter::new(
            Arc::new(FailingStore),
            Arc::new(FakeCompleter::default()),
            "1",
        );
        let response = router.dispatch(improve("hi", None)).await;
        assert_eq!(response, Response::error("Failed to load settings"));
    }

    #[tokio::test]
    async fn test_request_selector_wins_over_stored() {
        let completer = Arc::new(FakeCompleter::default());
        let store = store_with(json!({
            "apiKey": "sk",
            "model": "m1",
            "messageType": "friendly",
            "savedPrompts": [{ "name": "Bold", "text": "Be bold." }]
        }));
        let router = MessageRouter::new(store, completer.clone(), "1");

        let response = router.dispatch(improve("hi", Some("custom_prompt_0"))).await;
        assert_eq!(response, Response::improved("improved: hi"));

        let (text, model, prompt) = completer.last.lock().clone().expect("called");
        assert_eq!(text, "hi");
        assert_eq!(model, "m1");
        assert!(prompt.starts_with("Be bold."));
        assert!(prompt.ends_with(NO_COMMENTARY_SUFFIX));
    }

    #[tokio::test]
    async fn test_blank_selector_uses_stored() {
        let completer = Arc::new(FakeCompleter::default());
        let store = store_with(json!({ "apiKey": "sk", "messageType": "concise" }));
        let router = MessageRouter::new(store, completer.clone(), "1");

        router.dispatch(improve("hi", Some(""))).await;

        let (_, model, prompt) = completer.last.lock().clone().expect("called");
        assert_eq!(model, DEFAULT_MODEL);
        assert_eq!(prompt, Tone::Concise.system_prompt());
    }

    #[tokio::test]
    async fn test_out_of_range_custom_prompt_is_professional() {
        let completer = Arc::new(FakeCompleter::default());
        let store = store_with(json!({ "apiKey": "sk" }));
        let router = MessageRouter::new(store, completer.clone(), "1");

        router.dispatch(improve("hi", Some("custom_prompt_7"))).await;

        let (_, _, prompt) = completer.last.lock().clone().expect("called");
        assert_eq!(prompt, Tone::Professional.system_prompt());
    }

    #[tokio::test]
    async fn test_null_stored_values_fall_back_to_defaults() {
        let completer = Arc::new(FakeCompleter::default());
        let store = store_with(json!({
            "apiKey": "sk",
            "model": null,
            "messageType": null,
            "savedPrompts": null
        }));
        let router = MessageRouter::new(store, completer.clone(), "1");

        let response = router.dispatch(improve("hi", Some("custom_prompt_0"))).await;
        assert_eq!(response, Response::improved("improved: hi"));

        let (_, model, prompt) = completer.last.lock().clone().expect("called");
        assert_eq!(model, DEFAULT_MODEL);
        assert_eq!(prompt, Tone::Professional.system_prompt());
    }

    #[tokio::test]
    async fn test_completion_failure_becomes_error_reply() {
        let completer = Arc::new(FakeCompleter {
            fail: true,
            ..Default::default()
        });
        let store = store_with(json!({ "apiKey": "sk" }));
        let router = MessageRouter::new(store, completer, "1");

        let response = router.dispatch(improve("hi", None)).await;
        assert_eq!(response, Response::error("No auth credentials found"));
    }

    #[tokio::test]
    async fn test_unknown_and_update_settings_are_rejected() {
        let router = MessageRouter::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FakeCompleter::default()),
            "1",
        );

        let unknown: Request = serde_json::from_value(json!({
            "action": "translate",
            "messageId": "550e8400-e29b-41d4-a716-446655440000"
        }))
        .expect("parse");
        assert_eq!(
            router.dispatch(unknown).await,
            Response::error("Unknown message type")
        );

        let update = Request::new(Action::UpdateSettings {
            settings: Default::default(),
        });
        assert_eq!(
            router.dispatch(update).await,
            Response::error("Unknown message type")
        );
    }

    #[tokio::test]
    async fn test_install_writes_defaults_without_credential() {
        let store = Arc::new(MemoryStore::new());
        let router = MessageRouter::new(store.clone(), Arc::new(FakeCompleter::default()), "1");

        router.on_installed(InstallReason::Install).await;

        let entries = store
            .get(&[keys::MODEL, keys::MESSAGE_TYPE])
            .await
            .expect("get");
        assert_eq!(entries.get(keys::MODEL), Some(&json!(DEFAULT_MODEL)));
        assert_eq!(entries.get(keys::MESSAGE_TYPE), Some(&json!("professional")));
    }

    #[tokio::test]
    async fn test_install_keeps_existing_setup() {
        let store = store_with(json!({ "apiKey": "sk", "model": "custom/model" }));
        let router = MessageRouter::new(store.clone(), Arc::new(FakeCompleter::default()), "1");

        router.on_installed(InstallReason::Install).await;
        router.on_installed(InstallReason::Update).await;

        let entries = store.get(&[keys::MODEL]).await.expect("get");
        assert_eq!(entries.get(keys::MODEL), Some(&json!("custom/model")));
    }
}
