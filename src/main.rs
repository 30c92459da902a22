// =============================================================================
// Stochastic Dashboard: Main Entry Point
// =============================================================================
//
// Loads configuration, builds the Kraken client and serves the indicator API
// until Ctrl+C.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stoch_dash::api;
use stoch_dash::app_state::AppState;
use stoch_dash::kraken::KrakenClient;
use stoch_dash::runtime_config::{DashboardConfig, CONFIG_FILE, ENV_CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Stochastic dashboard starting up");

    let config_path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| CONFIG_FILE.into());
    let mut config = DashboardConfig::load_or_init(&config_path);
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate().context("dashboard configuration rejected")?;

    info!(
        assets = config.assets.len(),
        interval = config.interval,
        window_k = config.window_k,
        smoothing_d = config.smoothing_d,
        ma_window = config.ma_window,
        "Indicator defaults"
    );

    // ── 2. Exchange client ───────────────────────────────────────────────
    let client = KrakenClient::new(config.kraken_base_url.clone(), config.request_timeout())
        .context("failed to build Kraken HTTP client")?;

    // ── 3. Shared state & API server ─────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Arc::new(client)));
    let app = api::rest::router(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, started_at = %state.started_at(), "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!(uptime_secs = state.uptime_secs(), "Stochastic dashboard shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, stopping gracefully");
}
