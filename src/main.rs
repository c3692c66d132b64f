//! birdnotify - BirdNET detection notification relay
//!
//! Single-binary HTTP service: POST a detection record, it reaches Signal
//! (and optionally Slack). Configuration comes entirely from the
//! environment; missing sender identity or recipients is fatal at boot.

use anyhow::Result;
use tracing::info;

use birdnotify::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting birdnotify v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = Config::from_env()?;
    info!(
        gateway = %config.signal_api_url,
        recipients = config.recipients.len(),
        return_early = config.return_early,
        attach_recording = config.attach_recording,
        secondary = config.slack_webhook_url.is_some(),
        image_lookup = config.unsplash_api_key.is_some(),
        "Configuration loaded"
    );

    let port = config.http_port;
    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("birdnotify listening on http://0.0.0.0:{}/", port);

    axum::serve(listener, app).await?;

    Ok(())
}
