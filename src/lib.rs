//! birdnotify library - BirdNET detection notification relay
//!
//! Receives wildlife-detection notifications over HTTP, parses the
//! semi-structured detection message, resolves the optional audio recording
//! from the By_Date archive, and fans out to a Signal messaging gateway
//! (required) and a Slack webhook (best-effort).

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue},
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod parser;
pub mod payload;
pub mod services;
pub mod types;
pub mod validator;

pub use config::Config;
pub use error::NotifyError;

use services::{RecordingResolver, SignalClient, SlackClient, UnsplashClient};

/// Inbound JSON bodies are capped at 1 MiB
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub signal: Arc<SignalClient>,
    pub resolver: Arc<RecordingResolver>,
    /// Absent when no webhook URL is configured; disables secondary dispatch
    pub slack: Option<Arc<SlackClient>>,
    /// Absent when no API key is configured; disables image lookup
    pub unsplash: Option<Arc<UnsplashClient>>,
}

impl AppState {
    /// Build application state and outbound clients from configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let signal = Arc::new(SignalClient::new(&config.signal_api_url)?);
        let resolver = Arc::new(RecordingResolver::new()?);

        let slack = config
            .slack_webhook_url
            .clone()
            .map(SlackClient::new)
            .transpose()?
            .map(Arc::new);

        let unsplash = config
            .unsplash_api_key
            .clone()
            .map(UnsplashClient::new)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            config: Arc::new(config),
            signal,
            resolver,
            slack,
            unsplash,
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let served_by = HeaderValue::from_str(&hostname())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));

    Router::new()
        .route("/", get(api::usage_hint).post(api::notify))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-served-by"),
            served_by,
        ))
        .with_state(state)
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}
