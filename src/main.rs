use std::sync::Arc;

use anyhow::Context;
use digisathi_relay::{config::Config, routes, state::AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(?config, "configuration loaded");

    let port = config.port;
    let state = Arc::new(AppState::new(config).context("failed to build upstream HTTP client")?);
    let app = routes::app(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to address: {addr}"))?;

    info!("🚀 DigiSathi relay running on http://localhost:{port}");
    axum::serve(listener, app)
        .await
        .context("server error")?;

    Ok(())
}
