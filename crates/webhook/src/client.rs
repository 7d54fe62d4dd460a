//! The HTTP seam for outbound webhook calls.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Client-enforced bound on the fire-and-forget POST so a slow or
/// unreachable engine cannot hold a request handler indefinitely.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Error)]
pub enum WebhookClientError {
    #[error("webhook request failed: {0}")]
    Transport(String),

    #[error("webhook responded with status {0}")]
    Status(u16),
}

/// Performs one signed JSON POST. No retries at this layer.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        header_name: &str,
        header_value: &str,
        body: &serde_json::Value,
    ) -> Result<(), WebhookClientError>;
}

/// reqwest-backed client with the dispatch timeout baked in.
pub struct HttpWebhookClient {
    http: reqwest::Client,
}

impl HttpWebhookClient {
    pub fn new() -> Result<Self, WebhookClientError> {
        let http = reqwest::Client::builder()
            .timeout(DISPATCH_TIMEOUT)
            .build()
            .map_err(|e| WebhookClientError::Transport(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn post_json(
        &self,
        url: &str,
        header_name: &str,
        header_value: &str,
        body: &serde_json::Value,
    ) -> Result<(), WebhookClientError> {
        let response = self
            .http
            .post(url)
            .header(header_name, header_value)
            .json(body)
            .send()
            .await
            .map_err(|e| WebhookClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookClientError::Status(status.as_u16()));
        }
        Ok(())
    }
}
