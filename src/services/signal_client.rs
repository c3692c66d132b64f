//! Signal messaging gateway client
//!
//! Posts notification payloads to a Dockerized Signal Messenger REST API
//! (bbernhard/signal-cli-rest-api). This is the required send: its failure
//! surfaces to the caller unless the service is in return-early mode.

use std::time::Duration;

use thiserror::Error;

use crate::types::NotificationPayload;

const USER_AGENT: &str = "birdnotify/0.1.0";
const SEND_TIMEOUT_SECS: u64 = 10;

/// Signal gateway client errors
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway error {status}: {body}")]
    Gateway { status: u16, body: String },
}

impl SignalError {
    /// Error detail for the HTTP response: the gateway's response body when
    /// one was received, otherwise the error message.
    pub fn detail(&self) -> String {
        match self {
            SignalError::Gateway { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Signal messaging gateway client
pub struct SignalClient {
    http_client: reqwest::Client,
    send_url: String,
}

impl SignalClient {
    /// Build a client against the gateway base URL; trailing slashes on the
    /// base are tolerated.
    pub fn new(base_url: &str) -> Result<Self, SignalError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .map_err(|e| SignalError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            send_url: format!("{}/v2/send", base_url.trim_end_matches('/')),
        })
    }

    /// Send a notification through the gateway.
    pub async fn send(&self, payload: &NotificationPayload) -> Result<(), SignalError> {
        tracing::debug!(url = %self.send_url, "Sending notification to Signal gateway");

        let response = self
            .http_client
            .post(&self.send_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| SignalError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SignalError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            recipients = payload.recipients.len(),
            attachments = payload.attachments.len(),
            "Notification sent to Signal gateway"
        );

        Ok(())
    }
}
