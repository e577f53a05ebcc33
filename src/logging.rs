//! Tracing subscriber setup

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("Invalid log filter '{}': {e}", config.level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.with_target(false).try_init(),
    }
    .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}
