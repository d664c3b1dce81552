//! Content surface: the per-tab inline improve trigger.
//!
//! Holds a cached [`ContentSettings`] snapshot, sends `improveText` through
//! the [`DeliveryProtocol`] and receives `updateSettings` broadcasts from the
//! popup.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::delivery::{DeliveryOutcome, DeliveryProtocol, Notice};
use crate::error::Result;
use crate::identifiers::TabId;
use crate::protocol::{Action, Request, Response};
use crate::settings::{ContentSettings, SettingsContext};
use crate::transport::MessageHandler;

// ============================================================================
// Types
// ============================================================================

/// Result of one improve trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Nothing to improve; no message sent.
    Skipped,
    /// Replacement text for the field.
    Replaced(String),
    /// Alert to show.
    Alert(Notice),
}

/// Field contents after a snippet expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// New field text.
    pub text: String,
    /// New cursor position, a byte offset into `text`.
    pub cursor: usize,
}

// ============================================================================
// ProcessingGuard
// ============================================================================

/// Marks the trigger busy for as long as it lives.
struct ProcessingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> ProcessingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

// ============================================================================
// ContentSurface
// ============================================================================

struct ContentInner {
    tab_id: TabId,
    settings: SettingsContext<ContentSettings>,
    delivery: DeliveryProtocol,
    processing: AtomicUsize,
}

/// Content surface of one tab.
///
/// Cloning shares the same state.
#[derive(Clone)]
pub struct ContentSurface {
    inner: Arc<ContentInner>,
}

impl fmt::Debug for ContentSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSurface")
            .field("tab_id", &self.inner.tab_id)
            .field("processing", &self.is_processing())
            .finish_non_exhaustive()
    }
}

impl ContentSurface {
    /// Creates a surface with default settings.
    ///
    /// Call [`ContentSurface::init`] to load the stored settings.
    #[must_use]
    pub fn new(
        tab_id: TabId,
        settings: SettingsContext<ContentSettings>,
        delivery: DeliveryProtocol,
    ) -> Self {
        Self {
            inner: Arc::new(ContentInner {
                tab_id,
                settings,
                delivery,
                processing: AtomicUsize::new(0),
            }),
        }
    }

    /// Tab hosting this surface.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.inner.tab_id
    }

    /// Loads the stored settings. A failure keeps the current snapshot.
    pub async fn init(&self) {
        if let Err(e) = self.reload().await {
            error!(tab_id = %self.inner.tab_id, error = %e, "Error loading settings");
        }
    }

    /// Refreshes the cached settings from the store.
    ///
    /// # Errors
    ///
    /// Propagates store and deserialization failures.
    pub async fn reload(&self) -> Result<()> {
        self.inner.settings.reload().await
    }

    /// Replaces the cached settings.
    pub fn apply(&self, settings: ContentSettings) {
        self.inner.settings.apply(settings);
    }

    /// Current cached settings.
    #[must_use]
    pub fn settings(&self) -> ContentSettings {
        self.inner.settings.snapshot()
    }

    /// Returns `true` while an improve is in flight.
    #[inline]
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.inner.processing.load(Ordering::Acquire) > 0
    }

    /// Returns `true` if the inline button should be offered for `text`.
    #[must_use]
    pub fn should_show_button(&self, text: &str) -> bool {
        self.inner.settings.read(|s| s.enable_inline_button) && !text.trim().is_empty()
    }

    /// Label of the inline tone, or `None` when the indicator is hidden.
    #[must_use]
    pub fn type_label(&self) -> Option<String> {
        self.inner.settings.read(|s| {
            s.show_type_indicator
                .then(|| s.inline_message_type.label(&s.saved_prompts))
        })
    }

    /// Runs the inline improve trigger on `text`.
    pub async fn improve(&self, text: &str) -> TriggerOutcome {
        if text.trim().is_empty() {
            return TriggerOutcome::Skipped;
        }

        let _guard = ProcessingGuard::enter(&self.inner.processing);
        let selector = self.inner.settings.read(|s| s.inline_message_type.clone());

        debug!(tab_id = %self.inner.tab_id, %selector, "Improve triggered");

        match self.inner.delivery.improve_text(text, Some(&selector)).await {
            Ok(delivery) => match delivery.outcome {
                DeliveryOutcome::Improved(text) => TriggerOutcome::Replaced(text),
                DeliveryOutcome::Rejected(message) => {
                    TriggerOutcome::Alert(Notice::Rejected(message))
                }
            },
            Err(e) => {
                error!(tab_id = %self.inner.tab_id, error = %e, "Improve failed");
                TriggerOutcome::Alert(Notice::from_error(&e))
            }
        }
    }

    /// Expands a snippet trigger ending at `cursor`.
    ///
    /// `cursor` is a byte offset. Returns `None` if no trigger ends there or
    /// the offset is not a character boundary of `text`.
    #[must_use]
    pub fn expand_snippet(&self, text: &str, cursor: usize) -> Option<Expansion> {
        let before = text.get(..cursor)?;

        self.inner.settings.read(|s| {
            s.snippets
                .iter()
                .find(|snippet| !snippet.trigger.is_empty() && before.ends_with(&snippet.trigger))
                .map(|snippet| {
                    let start = cursor - snippet.trigger.len();
                    let mut expanded =
                        String::with_capacity(text.len() - snippet.trigger.len() + snippet.content.len());
                    expanded.push_str(&text[..start]);
                    expanded.push_str(&snippet.content);
                    expanded.push_str(&text[cursor..]);

                    Expansion {
                        text: expanded,
                        cursor: start + snippet.content.len(),
                    }
                })
        })
    }
}

#[async_trait]
impl MessageHandler for ContentSurface {
    async fn handle(&self, request: Request) -> Option<Response> {
        match request.action {
            Action::UpdateSettings { settings } => {
                info!(tab_id = %self.inner.tab_id, "Settings updated");
                self.apply(settings);
            }
            other => {
                debug!(tab_id = %self.inner.tab_id, action = other.name(), "Ignoring message");
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
