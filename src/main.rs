use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use whereabout::{FallbackStore, Orchestrator, WhereaboutConfig, logging, web};

/// Tell me about this place: one JSON document from a geocoder, a weather
/// forecast, an encyclopedia summary and a photo search
#[derive(Parser)]
#[command(name = "whereabout", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Port to listen on, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = WhereaboutConfig::load_from_path(cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init(&config.logging)?;

    let fallback =
        FallbackStore::load(&config.fallback).context("Failed to load fallback payloads")?;

    let orchestrator = Orchestrator::from_config(&config, Arc::new(fallback))
        .context("Failed to wire upstream clients")?;

    web::run(&config.server, orchestrator).await
}
