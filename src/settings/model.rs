//! Settings snapshot types.
//!
//! Field names follow the storage keys (camelCase on the wire).

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};

use super::tone::ToneSelector;

// ============================================================================
// Constants
// ============================================================================

/// Model used when none is stored.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3-8b-instruct";

/// Storage keys.
pub mod keys {
    /// API credential.
    pub const API_KEY: &str = "apiKey";
    /// Model identifier.
    pub const MODEL: &str = "model";
    /// Default tone selector.
    pub const MESSAGE_TYPE: &str = "messageType";
    /// Draft custom prompt text.
    pub const CUSTOM_PROMPT: &str = "customPrompt";
    /// Saved custom prompts.
    pub const SAVED_PROMPTS: &str = "savedPrompts";
    /// Inline button toggle.
    pub const ENABLE_INLINE_BUTTON: &str = "enableInlineButton";
    /// Tone selector used by the inline button.
    pub const INLINE_MESSAGE_TYPE: &str = "inlineMessageType";
    /// Type indicator toggle.
    pub const SHOW_TYPE_INDICATOR: &str = "showTypeIndicator";
    /// Text snippets.
    pub const SNIPPETS: &str = "snippets";
    /// Last completion call, epoch milliseconds (local area).
    pub const LAST_CALL_TIME: &str = "lastCallTime";

    /// Every key of the full settings snapshot.
    pub const ALL: &[&str] = &[
        API_KEY,
        MODEL,
        MESSAGE_TYPE,
        CUSTOM_PROMPT,
        SAVED_PROMPTS,
        ENABLE_INLINE_BUTTON,
        INLINE_MESSAGE_TYPE,
        SHOW_TYPE_INDICATOR,
        SNIPPETS,
    ];

    /// Keys a content surface caches.
    pub const CONTENT: &[&str] = &[
        ENABLE_INLINE_BUTTON,
        INLINE_MESSAGE_TYPE,
        SHOW_TYPE_INDICATOR,
        SAVED_PROMPTS,
        SNIPPETS,
    ];

    /// Keys the background needs to serve `improveText`.
    pub const IMPROVE: &[&str] = &[API_KEY, MODEL, MESSAGE_TYPE, SAVED_PROMPTS];
}

const fn enabled() -> bool {
    true
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

// Stored `null` reads as an absent key.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_model<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_model))
}

fn null_as_enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(enabled))
}

// ============================================================================
// SavedPrompt / Snippet
// ============================================================================

/// A named custom instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPrompt {
    /// Display name.
    pub name: String,
    /// Instruction text used as the system prompt.
    pub text: String,
}

impl SavedPrompt {
    /// Creates a saved prompt.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A trigger string that expands into longer content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Text typed by the user.
    pub trigger: String,
    /// Replacement text.
    pub content: String,
}

impl Snippet {
    /// Creates a snippet.
    #[inline]
    #[must_use]
    pub fn new(trigger: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            content: content.into(),
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Full settings snapshot as stored in the sync area.
///
/// Missing keys and keys stored as `null` take their defaults, so a
/// partially populated store always yields a usable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// API credential. `None` until first-time setup completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_model", deserialize_with = "null_as_default_model")]
    pub model: String,

    /// Default tone for the popup and for requests without one.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_type: ToneSelector,

    /// Draft text of the custom prompt editor.
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_prompt: String,

    /// Saved custom prompts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub saved_prompts: Vec<SavedPrompt>,

    /// Whether the inline button is shown on text fields.
    #[serde(default = "enabled", deserialize_with = "null_as_enabled")]
    pub enable_inline_button: bool,

    /// Tone used by the inline button.
    #[serde(default, deserialize_with = "null_as_default")]
    pub inline_message_type: ToneSelector,

    /// Whether the tone label is shown next to the button.
    #[serde(default = "enabled", deserialize_with = "null_as_enabled")]
    pub show_type_indicator: bool,

    /// Text snippets.
    #[serde(default, deserialize_with = "null_as_default")]
    pub snippets: Vec<Snippet>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            message_type: ToneSelector::default(),
            custom_prompt: String::new(),
            saved_prompts: Vec::new(),
            enable_inline_button: true,
            inline_message_type: ToneSelector::default(),
            show_type_indicator: true,
            snippets: Vec::new(),
        }
    }
}

impl Settings {
    /// Returns the credential if one is configured and non-blank.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// Extracts the subset broadcast to content surfaces.
    #[must_use]
    pub fn content(&self) -> ContentSettings {
        ContentSettings {
            enable_inline_button: self.enable_inline_button,
            inline_message_type: self.inline_message_type.clone(),
            show_type_indicator: self.show_type_indicator,
            saved_prompts: self.saved_prompts.clone(),
            snippets: self.snippets.clone(),
        }
    }
}

// ============================================================================
// ContentSettings
// ============================================================================

/// Settings a content surface needs, carried by `updateSettings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSettings {
    /// Whether the inline button is shown.
    #[serde(default = "enabled", deserialize_with = "null_as_enabled")]
    pub enable_inline_button: bool,

    /// Tone used by the inline button.
    #[serde(default, deserialize_with = "null_as_default")]
    pub inline_message_type: ToneSelector,

    /// Whether the tone label is shown.
    #[serde(default = "enabled", deserialize_with = "null_as_enabled")]
    pub show_type_indicator: bool,

    /// Saved custom prompts (for labels).
    #[serde(default, deserialize_with = "null_as_default")]
    pub saved_prompts: Vec<SavedPrompt>,

    /// Text snippets.
    #[serde(default, deserialize_with = "null_as_default")]
    pub snippets: Vec<Snippet>,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Settings::default().content()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tone;

    #[test]
    fn test_empty_object_yields_defaults() {
        let settings: Settings = serde_json::from_str("{}").expect("parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert!(settings.enable_inline_button);
        assert!(settings.show_type_indicator);
        assert!(settings.credential().is_none());
    }

    #[test]
    fn test_null_values_yield_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "apiKey": null,
                "model": null,
                "messageType": null,
                "customPrompt": null,
                "savedPrompts": null,
                "enableInlineButton": null,
                "inlineMessageType": null,
                "showTypeIndicator": null,
                "snippets": null
            }"#,
        )
        .expect("parse");
        assert_eq!(settings, Settings::default());

        let content: ContentSettings = serde_json::from_str(
            r#"{"enableInlineButton": null, "savedPrompts": null, "snippets": null}"#,
        )
        .expect("parse");
        assert_eq!(content, ContentSettings::default());
    }

    #[test]
    fn test_camel_case_keys() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "apiKey": "sk-or-1",
                "messageType": "friendly",
                "savedPrompts": [{"name": "Bold", "text": "Be bold."}],
                "enableInlineButton": false,
                "inlineMessageType": "custom_prompt_0",
                "snippets": [{"trigger": ";sig", "content": "Best, Ana"}]
            }"#,
        )
        .expect("parse");

        assert_eq!(settings.credential(), Some("sk-or-1"));
        assert_eq!(settings.message_type, ToneSelector::Preset(Tone::Friendly));
        assert_eq!(settings.inline_message_type, ToneSelector::Custom(0));
        assert!(!settings.enable_inline_button);
        assert_eq!(settings.snippets[0].trigger, ";sig");
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let settings = Settings {
            api_key: Some("   ".to_string()),
            ..Settings::default()
        };
        assert!(settings.credential().is_none());
    }

    #[test]
    fn test_content_subset() {
        let settings = Settings {
            enable_inline_button: false,
            saved_prompts: vec![SavedPrompt::new("Bold", "Be bold.")],
            ..Settings::default()
        };
        let content = settings.content();
        assert!(!content.enable_inline_button);
        assert_eq!(content.saved_prompts.len(), 1);

        let json = serde_json::to_value(&content).expect("serialize");
        assert!(json.get("apiKey").is_none());
        assert!(json.get("inlineMessageType").is_some());
    }
}
