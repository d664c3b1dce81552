//! HTTP client for the text-improvement provider.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::epoch_millis;
use crate::settings::keys;
use crate::settings::store::{self, SettingsStore};

use super::Completer;
use super::api::{ChatRequest, ChatResponse, ErrorBody};
use super::options::ClientOptions;

// ============================================================================
// CompletionClient
// ============================================================================

/// Client for the chat-completion and key-info endpoints.
///
/// The minimum interval between calls is tracked as `lastCallTime` in the
/// local store, so it holds across client instances sharing a store.
/// Reading and writing that timestamp is not atomic; two truly simultaneous
/// calls can both pass.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    completions_url: Url,
    key_info_url: Url,
    local: Arc<dyn SettingsStore>,
    options: ClientOptions,
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("completions_url", &self.completions_url.as_str())
            .field("min_interval", &self.options.min_interval)
            .finish_non_exhaustive()
    }
}

impl CompletionClient {
    /// Creates a client with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(local: Arc<dyn SettingsStore>) -> Result<Self> {
        Self::with_options(local, ClientOptions::new())
    }

    /// Creates a client with custom options.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::Http`] if the HTTP client cannot be built
    pub fn with_options(local: Arc<dyn SettingsStore>, options: ClientOptions) -> Result<Self> {
        options.validate()?;

        let base = options.base()?;
        let completions_url = join(&base, "chat/completions")?;
        let key_info_url = join(&base, "auth/key")?;

        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self {
            http,
            completions_url,
            key_info_url,
            local,
            options,
        })
    }

    /// Rewrites `text` under `system_prompt`.
    ///
    /// # Errors
    ///
    /// - [`Error::RateLimited`] if called within the minimum interval
    /// - [`Error::UpstreamHttp`] on a non-2xx status
    /// - [`Error::UpstreamShape`] if a 2xx body has no completion
    /// - [`Error::Http`] on transport failure
    pub async fn improve(
        &self,
        text: &str,
        credential: &str,
        model: &str,
        system_prompt: &str,
    ) -> Result<String> {
        self.claim_call_slot().await?;

        debug!(model, chars = text.chars().count(), "Requesting completion");

        let response = self
            .http
            .post(self.completions_url.clone())
            .bearer_auth(credential)
            .header(CONTENT_TYPE, "application/json")
            .header("HTTP-Referer", &self.options.referer)
            .header("X-Title", &self.options.title)
            .json(&ChatRequest::new(model, system_prompt, text))
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Completion request failed"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message =
                ErrorBody::message(&body).unwrap_or_else(|| format!("Error: {}", status.as_u16()));
            warn!(status = status.as_u16(), %message, "Completion rejected");
            return Err(Error::upstream_http(status.as_u16(), message));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| Error::upstream_shape(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::upstream_shape("response has no choices"))
    }

    /// Checks a credential against the key-info endpoint.
    ///
    /// Returns `true` iff the provider answers 2xx. Transport failures are
    /// logged and reported as `false`.
    pub async fn validate_credential(&self, credential: &str) -> bool {
        match self
            .http
            .get(self.key_info_url.clone())
            .header(AUTHORIZATION, format!("Bearer {credential}"))
            .send()
            .await
        {
            Ok(response) => {
                let valid = response.status().is_success();
                debug!(status = response.status().as_u16(), valid, "Credential checked");
                valid
            }
            Err(e) => {
                warn!(error = %e, "Error validating API key");
                false
            }
        }
    }

    /// Enforces the minimum interval and records this call.
    ///
    /// The slot is consumed before the network call, so a slow or failing
    /// call still counts.
    async fn claim_call_slot(&self) -> Result<()> {
        let now = epoch_millis();
        let min_interval = self.options.min_interval.as_millis() as u64;

        if let Some(last) = self.last_call_time().await {
            let elapsed = now.saturating_sub(last);
            if elapsed < min_interval {
                debug!(elapsed, min_interval, "Completion rate limited");
                return Err(Error::rate_limited(min_interval - elapsed));
            }
        }

        if let Err(e) = store::set_one(self.local.as_ref(), keys::LAST_CALL_TIME, now).await {
            warn!(error = %e, "Error setting last call time");
        }
        Ok(())
    }

    async fn last_call_time(&self) -> Option<u64> {
        match self.local.get(&[keys::LAST_CALL_TIME]).await {
            Ok(entries) => entries.get(keys::LAST_CALL_TIME).and_then(|v| v.as_u64()),
            Err(e) => {
                warn!(error = %e, "Error getting last call time");
                None
            }
        }
    }
}

#[async_trait]
impl Completer for CompletionClient {
    async fn improve(
        &self,
        text: &str,
        credential: &str,
        model: &str,
        system_prompt: &str,
    ) -> Result<String> {
        CompletionClient::improve(self, text, credential, model, system_prompt).await
    }

    async fn validate_credential(&self, credential: &str) -> bool {
        CompletionClient::validate_credential(self, credential).await
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| Error::config(format!("Invalid endpoint {path}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
