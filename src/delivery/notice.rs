//! User-facing classification of delivery results.
//!
//! Applied once, at the surface that shows the alert. Everything below
//! keeps the typed [`Error`].

use std::fmt;

use crate::error::Error;

/// Alert shown to the user after a failed improve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The background is gone; the page must be reloaded.
    ReloadExtension,
    /// A send timed out.
    ServiceBusy,
    /// Every ping failed.
    BackgroundNotResponding,
    /// The background answered with a handled error.
    Rejected(String),
    /// Any other failure.
    Failed(String),
}

impl Notice {
    /// Classifies a delivery error.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::ChannelUnavailable => Self::ReloadExtension,
            Error::TransportTimeout { .. } => Self::ServiceBusy,
            Error::BackgroundNotResponding { .. } => Self::BackgroundNotResponding,
            other => Self::Failed(other.to_string()),
        }
    }

    /// Alert text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::ReloadExtension => {
                "Browser extension needs to be reloaded. Please refresh this page and try again."
                    .to_string()
            }
            Self::ServiceBusy => {
                "Request timed out. The AI service might be busy, please try again in a moment."
                    .to_string()
            }
            Self::BackgroundNotResponding => {
                "Background service not responding. Please reload the page and try again."
                    .to_string()
            }
            Self::Rejected(message) => format!("Error improving text: {message}"),
            Self::Failed(message) => format!("Error: {message}"),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::MessageId;

    #[test]
    fn test_classification() {
        assert_eq!(
            Notice::from_error(&Error::ChannelUnavailable),
            Notice::ReloadExtension
        );
        assert_eq!(
            Notice::from_error(&Error::transport_timeout(MessageId::generate(), 60_000)),
            Notice::ServiceBusy
        );
        assert_eq!(
            Notice::from_error(&Error::background_not_responding(3)),
            Notice::BackgroundNotResponding
        );

        let other = Notice::from_error(&Error::malformed("empty response"));
        assert_eq!(
            other.message(),
            "Error: Empty or invalid response received: empty response"
        );
    }

    #[test]
    fn test_rejected_message() {
        let notice = Notice::Rejected("API key not set. Please set up the extension first.".into());
        assert_eq!(
            notice.to_string(),
            "Error improving text: API key not set. Please set up the extension first."
        );
    }
}
