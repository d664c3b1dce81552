//! Popup controller.
//!
//! Owns the settings form, the saved prompt and snippet lists and the
//! editing mode. Every mutation is persisted to the sync store and then
//! broadcast to the open tabs.
//!
//! # Editing Mode
//!
//! ```text
//! EditingPrompt(i) ◄── EditPrompt(i) ──── Idle ──── EditSnippet(i) ──► EditingSnippet(i)
//!        │                                 ▲                                  │
//!        └──────── SavePrompt / Cancel ────┴──── SaveSnippet / Cancel ────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::completion::Completer;
use crate::error::{Error, Result};
use crate::protocol::Action;
use crate::settings::store::{self, Entries, SettingsStore};
use crate::settings::{SavedPrompt, Settings, Snippet, ToneSelector, keys};
use crate::transport::{BroadcastSummary, SurfacePool};

// ============================================================================
// Constants
// ============================================================================

/// Origin label of popup broadcasts.
pub const POPUP_ORIGIN: &str = "popup";

const INVALID_KEY_BLANK: &str = "Please enter a valid API key.";
const INVALID_KEY_REJECTED: &str = "Invalid API key. Please check and try again.";
const EMPTY_MESSAGE: &str = "Please enter a message to improve.";
const MISSING_KEY: &str = "Please add your OpenRouter API key in settings.";

// ============================================================================
// Types
// ============================================================================

/// Which view the popup opens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupView {
    /// No credential yet.
    FirstTimeSetup,
    /// Configured.
    Main,
}

/// Editing mode of the prompt/snippet editors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PopupMode {
    /// Save actions append.
    #[default]
    Idle,
    /// Save replaces the saved prompt at this index.
    EditingPrompt(usize),
    /// Save replaces the snippet at this index.
    EditingSnippet(usize),
}

/// User action on the prompt and snippet editors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupAction {
    /// Save the prompt editor contents.
    SavePrompt {
        /// Prompt name.
        name: String,
        /// Prompt instructions.
        text: String,
    },
    /// Delete the saved prompt at this index.
    DeletePrompt(usize),
    /// Load the saved prompt at this index into the editor.
    EditPrompt(usize),
    /// Save the snippet editor contents.
    SaveSnippet {
        /// Trigger text.
        trigger: String,
        /// Expansion.
        content: String,
        /// User confirmed replacing a snippet with the same trigger.
        confirmed: bool,
    },
    /// Delete the snippet at this index.
    DeleteSnippet(usize),
    /// Load the snippet at this index into the editor.
    EditSnippet(usize),
    /// Leave editing mode.
    Cancel,
}

/// What a dispatched action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Lists changed, were persisted and broadcast.
    Saved(BroadcastSummary),
    /// Entered an editing mode.
    Editing(PopupMode),
    /// Back to idle without changes.
    Cancelled,
    /// A snippet with this trigger exists; resend with `confirmed: true`.
    ConfirmReplace {
        /// Conflicting trigger.
        trigger: String,
    },
    /// Index out of range; nothing changed.
    Ignored,
}

/// Settings form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    /// API credential.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Default tone.
    pub message_type: ToneSelector,
    /// Custom prompt draft.
    pub custom_prompt: String,
    /// Inline button toggle.
    pub enable_inline_button: bool,
    /// Inline tone.
    pub inline_message_type: ToneSelector,
    /// Tone label toggle.
    pub show_type_indicator: bool,
}

impl SettingsForm {
    /// Pre-fills the form from a snapshot.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone().unwrap_or_default(),
            model: settings.model.clone(),
            message_type: settings.message_type.clone(),
            custom_prompt: settings.custom_prompt.clone(),
            enable_inline_button: settings.enable_inline_button,
            inline_message_type: settings.inline_message_type.clone(),
            show_type_indicator: settings.show_type_indicator,
        }
    }
}

// ============================================================================
// PopupController
// ============================================================================

/// Popup surface.
pub struct PopupController {
    store: Arc<dyn SettingsStore>,
    completer: Arc<dyn Completer>,
    pool: Arc<SurfacePool>,
    settings: Mutex<Settings>,
    mode: Mutex<PopupMode>,
}

impl PopupController {
    /// Creates a controller with default settings.
    #[must_use]
    pub fn new(
        store: Arc<dyn SettingsStore>,
        completer: Arc<dyn Completer>,
        pool: Arc<SurfacePool>,
    ) -> Self {
        Self {
            store,
            completer,
            pool,
            settings: Mutex::new(Settings::default()),
            mode: Mutex::new(PopupMode::Idle),
        }
    }

    /// Loads all settings, broadcasts the content subset and picks the
    /// view.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn open(&self) -> Result<PopupView> {
        let settings: Settings = store::load(self.store.as_ref(), keys::ALL).await?;
        let view = if settings.credential().is_some() {
            PopupView::Main
        } else {
            PopupView::FirstTimeSetup
        };
        *self.settings.lock() = settings;
        *self.mode.lock() = PopupMode::Idle;

        self.broadcast().await;
        debug!(?view, "Popup opened");
        Ok(view)
    }

    /// Cached settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings.lock().clone()
    }

    /// Form pre-filled from the cached settings.
    #[must_use]
    pub fn form(&self) -> SettingsForm {
        SettingsForm::from_settings(&self.settings.lock())
    }

    /// Current editing mode.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> PopupMode {
        *self.mode.lock()
    }

    /// Validates and stores the first credential.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a blank or rejected key
    /// - store failures
    pub async fn first_time_setup(&self, api_key: &str, model: &str) -> Result<()> {
        let api_key = self.checked_credential(api_key).await?;

        let mut entries = Entries::new();
        entries.insert(keys::API_KEY.into(), api_key.clone().into());
        entries.insert(keys::MODEL.into(), model.into());
        entries.insert(
            keys::MESSAGE_TYPE.into(),
            ToneSelector::default().to_string().into(),
        );
        self.store.set(entries).await?;

        let mut settings = self.settings.lock();
        settings.api_key = Some(api_key);
        settings.model = model.to_string();
        settings.message_type = ToneSelector::default();
        info!("First-time setup complete");
        Ok(())
    }

    /// Validates and stores the settings form, then broadcasts.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a blank or rejected key
    /// - store failures
    pub async fn save_settings(&self, form: SettingsForm) -> Result<BroadcastSummary> {
        let api_key = self.checked_credential(&form.api_key).await?;

        let mut updated = self.settings();
        updated.api_key = Some(api_key);
        updated.model = form.model;
        updated.message_type = form.message_type;
        updated.custom_prompt = form.custom_prompt;
        updated.enable_inline_button = form.enable_inline_button;
        updated.inline_message_type = form.inline_message_type;
        updated.show_type_indicator = form.show_type_indicator;

        store::save(self.store.as_ref(), &updated).await?;
        *self.settings.lock() = updated;
        info!("Settings saved");
        Ok(self.broadcast().await)
    }

    /// Improves `text` from the popup editor with `selector`.
    ///
    /// Surrounding whitespace is not sent.
    ///
    /// Calls the completion client directly; the delivery protocol is a
    /// content-side concern.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for blank text
    /// - [`Error::ConfigMissing`] without a credential
    /// - completion failures
    pub async fn improve(&self, text: &str, selector: &ToneSelector) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid_argument(EMPTY_MESSAGE));
        }

        let (credential, model, system_prompt) = {
            let settings = self.settings.lock();
            let credential = settings
                .credential()
                .map(str::to_string)
                .ok_or_else(|| Error::ConfigMissing {
                    message: MISSING_KEY.to_string(),
                })?;
            (
                credential,
                settings.model.clone(),
                selector.system_prompt(&settings.saved_prompts),
            )
        };

        self.completer
            .improve(text, &credential, &model, &system_prompt)
            .await
    }

    /// Applies a prompt/snippet editor action.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for missing fields
    /// - store failures
    pub async fn dispatch(&self, action: PopupAction) -> Result<DispatchOutcome> {
        let mode = self.mode();
        debug!(?mode, ?action, "Popup action");

        match action {
            PopupAction::SavePrompt { name, text } => self.save_prompt(mode, &name, &text).await,
            PopupAction::DeletePrompt(index) => self.delete_prompt(index).await,
            PopupAction::EditPrompt(index) => {
                let valid = index < self.settings.lock().saved_prompts.len();
                Ok(self.enter(valid, PopupMode::EditingPrompt(index)))
            }
            PopupAction::SaveSnippet {
                trigger,
                content,
                confirmed,
            } => self.save_snippet(mode, &trigger, &content, confirmed).await,
            PopupAction::DeleteSnippet(index) => self.delete_snippet(index).await,
            PopupAction::EditSnippet(index) => {
                let valid = index < self.settings.lock().snippets.len();
                Ok(self.enter(valid, PopupMode::EditingSnippet(index)))
            }
            PopupAction::Cancel => {
                *self.mode.lock() = PopupMode::Idle;
                Ok(DispatchOutcome::Cancelled)
            }
        }
    }

    /// Pushes the content settings to every open tab.
    pub async fn broadcast(&self) -> BroadcastSummary {
        let content = self.settings.lock().content();
        self.pool
            .broadcast(Action::UpdateSettings { settings: content }, POPUP_ORIGIN)
            .await
    }

    // ========================================================================
    // Actions
    // ========================================================================

    // Each mutation edits a copy, writes it, and only then commits it to the
    // cache and the mode. A failed write leaves both untouched.

    fn enter(&self, valid: bool, mode: PopupMode) -> DispatchOutcome {
        if !valid {
            return DispatchOutcome::Ignored;
        }
        *self.mode.lock() = mode;
        DispatchOutcome::Editing(mode)
    }

    async fn save_prompt(&self, mode: PopupMode, name: &str, text: &str) -> Result<DispatchOutcome> {
        let (name, text) = (name.trim(), text.trim());
        if text.is_empty() {
            return Err(Error::invalid_argument(
                "Please enter prompt instructions before saving.",
            ));
        }
        if name.is_empty() {
            return Err(Error::invalid_argument("Please enter a name for your prompt."));
        }

        let prompt = SavedPrompt::new(name, text);
        let mut saved_prompts = self.settings.lock().saved_prompts.clone();
        match mode {
            PopupMode::EditingPrompt(index) if index < saved_prompts.len() => {
                saved_prompts[index] = prompt;
            }
            _ => saved_prompts.push(prompt),
        }

        store::set_one(self.store.as_ref(), keys::SAVED_PROMPTS, &saved_prompts).await?;
        self.settings.lock().saved_prompts = saved_prompts;
        *self.mode.lock() = PopupMode::Idle;
        Ok(DispatchOutcome::Saved(self.broadcast().await))
    }

    async fn delete_prompt(&self, index: usize) -> Result<DispatchOutcome> {
        let (mut saved_prompts, message_type, inline_message_type) = {
            let settings = self.settings.lock();
            if index >= settings.saved_prompts.len() {
                return Ok(DispatchOutcome::Ignored);
            }
            (
                settings.saved_prompts.clone(),
                settings.message_type.clone().after_prompt_removed(index),
                settings.inline_message_type.clone().after_prompt_removed(index),
            )
        };
        saved_prompts.remove(index);

        let mut entries = Entries::new();
        entries.insert(keys::SAVED_PROMPTS.into(), serde_json::to_value(&saved_prompts)?);
        entries.insert(keys::MESSAGE_TYPE.into(), message_type.to_string().into());
        entries.insert(
            keys::INLINE_MESSAGE_TYPE.into(),
            inline_message_type.to_string().into(),
        );
        self.store.set(entries).await?;

        {
            let mut settings = self.settings.lock();
            settings.saved_prompts = saved_prompts;
            settings.message_type = message_type;
            settings.inline_message_type = inline_message_type;
        }
        self.shift_mode_after_prompt_removed(index);
        info!(index, "Prompt deleted");
        Ok(DispatchOutcome::Saved(self.broadcast().await))
    }

    async fn save_snippet(
        &self,
        mode: PopupMode,
        trigger: &str,
        content: &str,
        confirmed: bool,
    ) -> Result<DispatchOutcome> {
        let (trigger, content) = (trigger.trim(), content.trim());
        if trigger.is_empty() {
            return Err(Error::invalid_argument("Please enter a trigger for your snippet."));
        }
        if content.is_empty() {
            return Err(Error::invalid_argument("Please enter content for your snippet."));
        }

        let mut snippets = self.settings.lock().snippets.clone();
        let existing = snippets.iter().position(|s| s.trigger == trigger);

        match mode {
            PopupMode::EditingSnippet(mut index) if index < snippets.len() => {
                if let Some(other) = existing.filter(|&other| other != index) {
                    if !confirmed {
                        return Ok(confirm_replace(trigger));
                    }
                    snippets.remove(other);
                    if other < index {
                        index -= 1;
                    }
                }
                snippets[index] = Snippet::new(trigger, content);
            }
            _ => match existing {
                Some(_) if !confirmed => return Ok(confirm_replace(trigger)),
                Some(other) => snippets[other].content = content.to_string(),
                None => snippets.push(Snippet::new(trigger, content)),
            },
        }

        store::set_one(self.store.as_ref(), keys::SNIPPETS, &snippets).await?;
        self.settings.lock().snippets = snippets;
        *self.mode.lock() = PopupMode::Idle;
        Ok(DispatchOutcome::Saved(self.broadcast().await))
    }

    async fn delete_snippet(&self, index: usize) -> Result<DispatchOutcome> {
        let mut snippets = self.settings.lock().snippets.clone();
        if index >= snippets.len() {
            return Ok(DispatchOutcome::Ignored);
        }
        snippets.remove(index);

        store::set_one(self.store.as_ref(), keys::SNIPPETS, &snippets).await?;
        self.settings.lock().snippets = snippets;

        {
            let mut mode = self.mode.lock();
            *mode = match *mode {
                PopupMode::EditingSnippet(i) if i == index => PopupMode::Idle,
                PopupMode::EditingSnippet(i) if i > index => PopupMode::EditingSnippet(i - 1),
                other => other,
            };
        }
        Ok(DispatchOutcome::Saved(self.broadcast().await))
    }

    fn shift_mode_after_prompt_removed(&self, removed: usize) {
        let mut mode = self.mode.lock();
        *mode = match *mode {
            PopupMode::EditingPrompt(i) if i == removed => PopupMode::Idle,
            PopupMode::EditingPrompt(i) if i > removed => PopupMode::EditingPrompt(i - 1),
            other => other,
        };
    }

    async fn checked_credential(&self, api_key: &str) -> Result<String> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::invalid_argument(INVALID_KEY_BLANK));
        }
        if !self.completer.validate_credential(api_key).await {
            return Err(Error::invalid_argument(INVALID_KEY_REJECTED));
        }
        Ok(api_key.to_string())
    }
}

fn confirm_replace(trigger: &str) -> DispatchOutcome {
    DispatchOutcome::ConfirmReplace {
        trigger: trigger.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::settings::MemoryStore;

    struct FakeCompleter {
        valid_key: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Completer for FakeCompleter {
        async fn improve(
            &self,
            text: &str,
            credential: &str,
            model: &str,
            system_prompt: &str,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{credential}|{model}|{system_prompt}|{text}"))
        }

        async fn validate_credential(&self, credential: &str) -> bool {
            credential == self.valid_key
        }
    }

    /// Serves reads from an inner store and refuses every write.
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl SettingsStore for ReadOnlyStore {
        async fn get(&self, keys: &[&str]) -> Result<Entries> {
            self.0.get(keys).await
        }

        async fn set(&self, _entries: Entries) -> Result<()> {
            Err(Error::store("quota exceeded"))
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        completer: Arc<FakeCompleter>,
        popup: PopupController,
    }

    fn fixture(initial: serde_json::Value) -> Fixture {
        let store = Arc::new(match initial {
            serde_json::Value::Object(entries) => MemoryStore::with_entries(entries),
            _ => MemoryStore::new(),
        });
        let completer = Arc::new(FakeCompleter {
            valid_key: "sk-good",
            calls: AtomicUsize::new(0),
        });
        let popup = PopupController::new(
            store.clone(),
            completer.clone(),
            Arc::new(SurfacePool::new()),
        );
        Fixture {
            store,
            completer,
            popup,
        }
    }

    async fn stored(store: &MemoryStore, key: &str) -> Option<serde_json::Value> {
        store.get(&[key]).await.expect("get").get(key).cloned()
    }

    fn save_prompt(name: &str, text: &str) -> PopupAction {
        PopupAction::SavePrompt {
            name: name.into(),
            text: text.into(),
        }
    }

    fn save_snippet(trigger: &str, content: &str, confirmed: bool) -> PopupAction {
        PopupAction::SaveSnippet {
            trigger: trigger.into(),
            content: content.into(),
            confirmed,
        }
    }

    #[tokio::test]
    async fn test_open_picks_view() {
        let fresh = fixture(json!({}));
        assert_eq!(fresh.popup.open().await.expect("open"), PopupView::FirstTimeSetup);

        let configured = fixture(json!({ "apiKey": "sk-good" }));
        assert_eq!(configured.popup.open().await.expect("open"), PopupView::Main);
    }

    #[tokio::test]
    async fn test_first_time_setup_validation() {
        let f = fixture(json!({}));

        let blank = f.popup.first_time_setup("  ", "m").await.expect_err("blank");
        assert_eq!(blank.to_string(), "Please enter a valid API key.");

        let rejected = f.popup.first_time_setup("sk-bad", "m").await.expect_err("bad");
        assert_eq!(rejected.to_string(), "Invalid API key. Please check and try again.");
        assert_eq!(stored(&f.store, keys::API_KEY).await, None);

        f.popup.first_time_setup(" sk-good ", "m").await.expect("setup");
        assert_eq!(stored(&f.store, keys::API_KEY).await, Some(json!("sk-good")));
        assert_eq!(stored(&f.store, keys::MODEL).await, Some(json!("m")));
        assert_eq!(stored(&f.store, keys::MESSAGE_TYPE).await, Some(json!("professional")));
    }

    #[tokio::test]
    async fn test_save_settings_stores_form() {
        let f = fixture(json!({ "apiKey": "sk-good" }));
        f.popup.open().await.expect("open");

        let mut form = f.popup.form();
        form.model = "other/model".into();
        form.enable_inline_button = false;
        form.inline_message_type = ToneSelector::parse("friendly");
        f.popup.save_settings(form).await.expect("save");

        assert_eq!(stored(&f.store, keys::MODEL).await, Some(json!("other/model")));
        assert_eq!(stored(&f.store, keys::ENABLE_INLINE_BUTTON).await, Some(json!(false)));
        assert_eq!(stored(&f.store, keys::INLINE_MESSAGE_TYPE).await, Some(json!("friendly")));
    }

    #[tokio::test]
    async fn test_improve_requires_text_and_credential() {
        let f = fixture(json!({}));
        f.popup.open().await.expect("open");
        let selector = ToneSelector::default();

        let empty = f.popup.improve(" ", &selector).await.expect_err("empty");
        assert_eq!(empty.to_string(), "Please enter a message to improve.");

        let missing = f.popup.improve("hi", &selector).await.expect_err("no key");
        assert!(matches!(missing, Error::ConfigMissing { .. }));
        assert_eq!(f.completer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_improve_resolves_prompt_locally() {
        let f = fixture(json!({
            "apiKey": "sk-good",
            "model": "m",
            "savedPrompts": [{ "name": "Bold", "text": "Be bold." }]
        }));
        f.popup.open().await.expect("open");

        let improved = f
            .popup
            .improve("hi", &ToneSelector::Custom(0))
            .await
            .expect("improve");
        assert!(improved.starts_with("sk-good|m|Be bold. IMPORTANT:"));
        assert!(improved.ends_with("|hi"));
    }

    #[tokio::test]
    async fn test_improve_sends_trimmed_text() {
        let f = fixture(json!({ "apiKey": "sk-good", "model": "m" }));
        f.popup.open().await.expect("open");

        let improved = f
            .popup
            .improve("\n  hi there  \t", &ToneSelector::default())
            .await
            .expect("improve");
        assert!(improved.ends_with("|hi there"));
    }

    #[tokio::test]
    async fn test_prompt_save_and_edit() {
        let f = fixture(json!({}));
        f.popup.open().await.expect("open");

        let err = f.popup.dispatch(save_prompt("", "Be bold.")).await.expect_err("name");
        assert_eq!(err.to_string(), "Please enter a name for your prompt.");

        f.popup.dispatch(save_prompt("Bold", "Be bold.")).await.expect("save");
        f.popup.dispatch(save_prompt("Calm", "Be calm.")).await.expect("save");

        let editing = f.popup.dispatch(PopupAction::EditPrompt(0)).await.expect("edit");
        assert_eq!(editing, DispatchOutcome::Editing(PopupMode::EditingPrompt(0)));

        f.popup.dispatch(save_prompt("Bolder", "Be bolder.")).await.expect("update");
        assert_eq!(f.popup.mode(), PopupMode::Idle);
        assert_eq!(
            stored(&f.store, keys::SAVED_PROMPTS).await,
            Some(json!([
                { "name": "Bolder", "text": "Be bolder." },
                { "name": "Calm", "text": "Be calm." }
            ]))
        );

        assert_eq!(
            f.popup.dispatch(PopupAction::EditPrompt(5)).await.expect("edit"),
            DispatchOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_delete_prompt_shifts_references() {
        let f = fixture(json!({
            "savedPrompts": [
                { "name": "A", "text": "a" },
                { "name": "B", "text": "b" },
                { "name": "C", "text": "c" }
            ],
            "messageType": "custom_prompt_2",
            "inlineMessageType": "custom_prompt_1"
        }));
        f.popup.open().await.expect("open");

        f.popup.dispatch(PopupAction::DeletePrompt(1)).await.expect("delete");

        assert_eq!(stored(&f.store, keys::MESSAGE_TYPE).await, Some(json!("custom_prompt_1")));
        assert_eq!(
            stored(&f.store, keys::INLINE_MESSAGE_TYPE).await,
            Some(json!("professional"))
        );
        assert_eq!(f.popup.settings().saved_prompts.len(), 2);
    }

    #[tokio::test]
    async fn test_snippet_duplicate_requires_confirmation() {
        let f = fixture(json!({ "snippets": [{ "trigger": "/sig", "content": "old" }] }));
        f.popup.open().await.expect("open");

        let outcome = f.popup.dispatch(save_snippet("/sig", "new", false)).await.expect("save");
        assert_eq!(outcome, DispatchOutcome::ConfirmReplace { trigger: "/sig".into() });
        assert_eq!(f.popup.settings().snippets[0].content, "old");

        f.popup.dispatch(save_snippet("/sig", "new", true)).await.expect("save");
        assert_eq!(
            stored(&f.store, keys::SNIPPETS).await,
            Some(json!([{ "trigger": "/sig", "content": "new" }]))
        );
    }

    #[tokio::test]
    async fn test_snippet_edit_replaces_conflict() {
        let f = fixture(json!({
            "snippets": [
                { "trigger": "/a", "content": "1" },
                { "trigger": "/b", "content": "2" },
                { "trigger": "/c", "content": "3" }
            ]
        }));
        f.popup.open().await.expect("open");

        f.popup.dispatch(PopupAction::EditSnippet(2)).await.expect("edit");
        let outcome = f.popup.dispatch(save_snippet("/a", "x", false)).await.expect("save");
        assert!(matches!(outcome, DispatchOutcome::ConfirmReplace { .. }));
        assert_eq!(f.popup.mode(), PopupMode::EditingSnippet(2));

        f.popup.dispatch(save_snippet("/a", "x", true)).await.expect("save");
        assert_eq!(
            f.popup.settings().snippets,
            vec![Snippet::new("/b", "2"), Snippet::new("/a", "x")]
        );
        assert_eq!(f.popup.mode(), PopupMode::Idle);
    }

    #[tokio::test]
    async fn test_delete_snippet_and_cancel() {
        let f = fixture(json!({
            "snippets": [{ "trigger": "/a", "content": "1" }, { "trigger": "/b", "content": "2" }]
        }));
        f.popup.open().await.expect("open");

        f.popup.dispatch(PopupAction::EditSnippet(1)).await.expect("edit");
        f.popup.dispatch(PopupAction::DeleteSnippet(0)).await.expect("delete");
        assert_eq!(f.popup.mode(), PopupMode::EditingSnippet(0));

        assert_eq!(
            f.popup.dispatch(PopupAction::Cancel).await.expect("cancel"),
            DispatchOutcome::Cancelled
        );
        assert_eq!(f.popup.mode(), PopupMode::Idle);
        assert_eq!(
            stored(&f.store, keys::SNIPPETS).await,
            Some(json!([{ "trigger": "/b", "content": "2" }]))
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_and_mode() {
        let initial = json!({
            "apiKey": "sk-good",
            "savedPrompts": [{ "name": "A", "text": "a" }, { "name": "B", "text": "b" }],
            "messageType": "custom_prompt_1",
            "snippets": [{ "trigger": "/a", "content": "1" }]
        });
        let serde_json::Value::Object(entries) = initial else {
            unreachable!("object literal");
        };
        let popup = PopupController::new(
            Arc::new(ReadOnlyStore(MemoryStore::with_entries(entries))),
            Arc::new(FakeCompleter {
                valid_key: "sk-good",
                calls: AtomicUsize::new(0),
            }),
            Arc::new(SurfacePool::new()),
        );
        popup.open().await.expect("open");
        let before = popup.settings();

        popup.dispatch(PopupAction::EditPrompt(0)).await.expect("edit");
        let save = popup.dispatch(save_prompt("C", "c")).await;
        assert!(matches!(save, Err(Error::Store { .. })));
        assert_eq!(popup.mode(), PopupMode::EditingPrompt(0));

        assert!(popup.dispatch(PopupAction::DeletePrompt(0)).await.is_err());
        assert_eq!(popup.mode(), PopupMode::EditingPrompt(0));

        popup.dispatch(PopupAction::EditSnippet(0)).await.expect("edit");
        assert!(popup.dispatch(save_snippet("/b", "2", false)).await.is_err());
        assert!(popup.dispatch(PopupAction::DeleteSnippet(0)).await.is_err());
        assert_eq!(popup.mode(), PopupMode::EditingSnippet(0));

        let mut form = popup.form();
        form.model = "other/model".into();
        assert!(popup.save_settings(form).await.is_err());

        assert_eq!(popup.settings(), before);
    }
}
