//! Configuration loading
//!
//! All configuration comes from the environment, is resolved once at process
//! start, and is passed into components as an immutable struct. Missing
//! required values are fatal at boot rather than at first request.

use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    MissingVar(&'static str),

    #[error("Invalid {0} environment variable: {1}")]
    InvalidVar(&'static str, String),
}

/// Process-wide immutable configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Signal Messenger REST API
    /// See https://github.com/bbernhard/signal-cli-rest-api
    pub signal_api_url: String,
    /// Sender identity registered with the gateway
    pub from_number: String,
    /// Destination handles; must be non-empty
    pub recipients: Vec<String>,
    pub http_port: u16,
    /// Respond 201 right after validation instead of waiting for the send
    pub return_early: bool,
    /// Fetch and inline the recording instead of linking to it
    pub attach_recording: bool,
    /// Team-chat webhook; absence disables secondary dispatch entirely
    pub slack_webhook_url: Option<String>,
    /// Image search credential; absence disables image lookup
    pub unsplash_api_key: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Split out from [`Config::from_env`] so tests can inject values without
    /// mutating process-wide environment state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signal_api_url =
            lookup("SIGNAL_API_URL").unwrap_or_else(|| "http://signal-api".to_string());

        let from_number = lookup("FROM_NUMBER")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar("FROM_NUMBER"))?;

        let recipients = split_recipients(&lookup("RECIPIENTS").unwrap_or_default());
        if recipients.is_empty() {
            return Err(ConfigError::MissingVar("RECIPIENTS"));
        }

        let http_port = match lookup("HTTP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar("HTTP_PORT", raw))?,
            None => 3000,
        };

        Ok(Self {
            signal_api_url,
            from_number,
            recipients,
            http_port,
            return_early: parse_bool(lookup("RETURN_EARLY").as_deref()),
            attach_recording: parse_bool(lookup("ATTACH_RECORDING").as_deref()),
            slack_webhook_url: lookup("SLACK_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
            unsplash_api_key: lookup("UNSPLASH_API_KEY").filter(|v| !v.trim().is_empty()),
        })
    }
}

/// Boolean flags accept `true`, `1`, or `on`; anything else is false.
fn parse_bool(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1") | Some("on"))
}

/// Split a comma-separated recipient list, tolerating whitespace after
/// commas and dropping empty entries.
fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
