mod backend;
mod bot;
mod config;
mod format;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize logging; RUST_LOG overrides the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Configuration loaded");
    info!("  Backend: {}", config.api_base_url);
    info!("  Log level: {}", config.log_level);

    let state = Arc::new(AppState::new(config)?);

    info!("Starting BCN Art Compass Telegram bot...");
    bot::run(state).await?;

    Ok(())
}
