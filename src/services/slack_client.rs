//! Slack webhook client
//!
//! Best-effort secondary channel. Failures are logged and swallowed; nothing
//! here may affect the primary send or the HTTP response.

use std::time::Duration;

use thiserror::Error;

use crate::types::SecondaryPayload;

const USER_AGENT: &str = "birdnotify/0.1.0";
const POST_TIMEOUT_SECS: u64 = 10;

/// Slack webhook errors
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Webhook error {status}: {body}")]
    Webhook { status: u16, body: String },
}

/// Slack incoming-webhook client
pub struct SlackClient {
    http_client: reqwest::Client,
    webhook_url: String,
}

impl SlackClient {
    pub fn new(webhook_url: String) -> Result<Self, SlackError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(POST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SlackError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            webhook_url,
        })
    }

    /// Post a payload to the webhook.
    pub async fn post(&self, payload: &SecondaryPayload) -> Result<(), SlackError> {
        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| SlackError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Webhook {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(blocks = payload.blocks.len(), "Posted to Slack webhook");
        Ok(())
    }
}
