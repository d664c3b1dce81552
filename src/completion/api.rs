//! Chat-completion wire types.

use serde::{Deserialize, Serialize};

/// Chat-completion request body.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 2],
}

impl<'a> ChatRequest<'a> {
    /// One system message followed by one user message.
    pub(crate) fn new(model: &'a str, system_prompt: &'a str, text: &'a str) -> Self {
        Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Success body: `{choices: [{message: {content}}]}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: String,
}

/// Error body: `{error: {message}}`, parsed best-effort.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: Option<String>,
}

impl ErrorBody {
    /// Extracts the provider message from a raw body, if there is one.
    pub(crate) fn message(raw: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(raw)
            .ok()
            .and_then(|body| body.error)
            .and_then(|detail| detail.message)
            .filter(|message| !message.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(ChatRequest::new("m", "sys", "hello")).expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({
                "model": "m",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hello" }
                ]
            })
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            ErrorBody::message(r#"{"error":{"message":"Invalid model","code":400}}"#),
            Some("Invalid model".to_string())
        );
        assert_eq!(ErrorBody::message(r#"{"error":"plain"}"#), None);
        assert_eq!(ErrorBody::message("<html>bad gateway</html>"), None);
    }
}
