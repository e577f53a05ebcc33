use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::ServerConfig;
use crate::orchestrator::Orchestrator;

const MAX_FORM_BYTES: usize = 16 * 1024;

/// Lookup routes plus the static welcome page for every other path
pub fn app(server: &ServerConfig, orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router(orchestrator))
        .fallback_service(ServeDir::new(&server.static_dir))
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(server: &ServerConfig, orchestrator: Orchestrator) -> Result<()> {
    let app = app(server, Arc::new(orchestrator));

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", server.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server stopped unexpectedly")?;

    tracing::info!("Web server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
