//! Webhook delivery for alert messages

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Status returned by the webhook endpoint.
///
/// `reason` is the canonical phrase for `status_code`, not the phrase the
/// server sent; it is empty for nonstandard codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub status_code: u16,
    pub reason: String,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Transport used to POST a JSON payload to a webhook
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Send `payload` to `url`. Any HTTP response is an outcome; only
    /// transport-level failures are errors.
    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<DeliveryOutcome, NotifierError>;
}

/// HTTP transport backed by reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<DeliveryOutcome, NotifierError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifierError::Transport(format!("Failed to send webhook: {}", e)))?;

        let status = response.status();
        Ok(DeliveryOutcome {
            status_code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}

/// Sends alert messages to a single webhook
pub struct Notifier {
    transport: Arc<dyn WebhookTransport>,
    webhook_url: String,
}

impl Notifier {
    pub fn new(transport: Arc<dyn WebhookTransport>, webhook_url: impl Into<String>) -> Self {
        Self {
            transport,
            webhook_url: webhook_url.into(),
        }
    }

    /// Post `message` as `{"text": message}` and log the outcome.
    ///
    /// Non-2xx statuses are logged, not returned as errors. Transport failures
    /// propagate to the caller untouched; nothing is retried.
    pub async fn dispatch(&self, message: &str) -> Result<DeliveryOutcome, NotifierError> {
        let payload = serde_json::json!({ "text": message });
        let outcome = self.transport.post_json(&self.webhook_url, &payload).await?;

        tracing::info!(
            "Sent message to webhook. Status {} - {}. Message: {}",
            outcome.status_code,
            outcome.reason,
            message
        );
        if !outcome.is_success() {
            tracing::warn!(
                status = outcome.status_code,
                "Webhook did not accept the message"
            );
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("webhook_url", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Webhook transport error: {0}")]
    Transport(String),
}
