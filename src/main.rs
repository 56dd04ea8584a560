// main.rs
// Axum server wiring: loads the JSON collections from DATA_DIR, recalculates
// derived fields, and serves the event socket.
//
// Endpoints:
// - GET /ws      -> event socket ({"event": ..., "data": ...} frames)
// - GET /health  -> collection counts

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use energiadev::{config::AppConfig, routes, state};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = AppConfig::from_env()?;
    let state = Arc::new(state::init_state(&config).context("failed to initialize state")?);

    let app = routes::build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
