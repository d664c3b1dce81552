//! Tone presets, custom prompt references and system prompt resolution.
//!
//! A selector is stored and sent as a plain string: one of the preset
//! names or `custom_prompt_<index>`. Anything else reads as `professional`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::SavedPrompt;

// ============================================================================
// Constants
// ============================================================================

/// Prefix of custom prompt references.
pub const CUSTOM_PROMPT_PREFIX: &str = "custom_prompt_";

/// Appended to every system prompt.
pub const NO_COMMENTARY_SUFFIX: &str = "IMPORTANT: Your response should ONLY contain the improved message without any explanations, introductions, or comments like 'Here's a rewritten version' or 'Here's the improved message'. Just output the improved message directly.";

/// Maximum characters of a custom prompt name shown as a label.
const LABEL_MAX_CHARS: usize = 10;

// ============================================================================
// Tone
// ============================================================================

/// Built-in tone presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tone {
    /// Polished, business-appropriate.
    #[default]
    Professional,
    /// Warm and conversational.
    Friendly,
    /// Customer-service reply.
    Customer,
    /// Short and to the point.
    Concise,
}

impl Tone {
    /// All presets in display order.
    pub const ALL: [Tone; 4] = [
        Tone::Professional,
        Tone::Friendly,
        Tone::Customer,
        Tone::Concise,
    ];

    /// Stored name of the preset.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Friendly => "friendly",
            Self::Customer => "customer",
            Self::Concise => "concise",
        }
    }

    /// Short label shown next to the inline button.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Professional => "Pro",
            Self::Friendly => "Friendly",
            Self::Customer => "Service",
            Self::Concise => "Concise",
        }
    }

    /// Instruction text without the suffix.
    #[must_use]
    const fn instruction(&self) -> &'static str {
        match self {
            Self::Professional => {
                "You are a professional editor. Improve the given message to make it more professional, polished, and business-appropriate. Fix grammar errors and enhance the expression while maintaining the original intent."
            }
            Self::Friendly => {
                "You are a friendly editor. Make this message warm, personable, and engaging while keeping it natural. Fix any errors but maintain a conversational tone."
            }
            Self::Customer => {
                "You are a customer service expert. Transform this message into a helpful, empathetic response that addresses customer needs professionally while maintaining a positive tone."
            }
            Self::Concise => {
                "You are a concise editor. Make this message brief, clear, and to-the-point while maintaining professionalism and all key information."
            }
        }
    }

    /// Full system prompt for the preset.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        with_suffix(self.instruction())
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tone| tone.as_str() == name)
    }
}

// ============================================================================
// ToneSelector
// ============================================================================

/// Which instruction governs a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToneSelector {
    /// Built-in preset.
    Preset(Tone),
    /// Index into the saved prompts list.
    Custom(usize),
}

impl Default for ToneSelector {
    fn default() -> Self {
        Self::Preset(Tone::Professional)
    }
}

impl ToneSelector {
    /// Parses a stored selector. Unknown values read as `professional`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if let Some(index) = value.strip_prefix(CUSTOM_PROMPT_PREFIX)
            && let Ok(index) = index.parse::<usize>()
        {
            return Self::Custom(index);
        }
        Tone::from_name(value).map_or_else(Self::default, Self::Preset)
    }

    /// Resolves the system prompt against the saved prompts.
    ///
    /// A custom reference that is out of range falls back to the
    /// professional preset.
    #[must_use]
    pub fn system_prompt(&self, saved_prompts: &[SavedPrompt]) -> String {
        match self {
            Self::Preset(tone) => tone.system_prompt(),
            Self::Custom(index) => saved_prompts
                .get(*index)
                .map_or_else(|| Tone::Professional.system_prompt(), |p| with_suffix(&p.text)),
        }
    }

    /// Label shown next to the inline button.
    #[must_use]
    pub fn label(&self, saved_prompts: &[SavedPrompt]) -> String {
        match self {
            Self::Preset(tone) => tone.label().to_string(),
            Self::Custom(index) => saved_prompts.get(*index).map_or_else(
                || "Custom".to_string(),
                |p| p.name.chars().take(LABEL_MAX_CHARS).collect(),
            ),
        }
    }

    /// Rewrites the selector after the saved prompt at `removed` is deleted.
    ///
    /// References past the removed slot shift down by one; a reference to
    /// the removed slot becomes `professional`.
    #[must_use]
    pub fn after_prompt_removed(self, removed: usize) -> Self {
        match self {
            Self::Custom(index) if index == removed => Self::default(),
            Self::Custom(index) if index > removed => Self::Custom(index - 1),
            other => other,
        }
    }
}

impl fmt::Display for ToneSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preset(tone) => f.write_str(tone.as_str()),
            Self::Custom(index) => write!(f, "{CUSTOM_PROMPT_PREFIX}{index}"),
        }
    }
}

impl From<String> for ToneSelector {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ToneSelector> for String {
    fn from(value: ToneSelector) -> Self {
        value.to_string()
    }
}

impl From<Tone> for ToneSelector {
    fn from(tone: Tone) -> Self {
        Self::Preset(tone)
    }
}

fn with_suffix(instruction: &str) -> String {
    format!("{instruction} {NO_COMMENTARY_SUFFIX}")
}

// ============================================================================
// Tests
// ============================================================================
