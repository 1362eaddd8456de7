// =============================================================================
// Stock Analyzer — Main Entry Point
// =============================================================================
//
// Serves technical analysis of daily stock prices over HTTP.  Price history
// comes either from the caller or from Alpha Vantage.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod indicators;
mod market_data;
mod runtime_config;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::{is_valid_api_key, ServiceConfig};

const DEFAULT_CONFIG_PATH: &str = "analyzer_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Stock Analyzer — Starting Up                     ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var("ANALYZER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = ServiceConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ServiceConfig::default()
    });
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate().context("invalid service configuration")?;

    match config.alpha_vantage_api_key.as_deref() {
        None => warn!("ALPHA_VANTAGE_API_KEY not set — /stock-data and /analysis will fail"),
        Some(key) if !is_valid_api_key(key) => {
            warn!("ALPHA_VANTAGE_API_KEY does not look like a provider key")
        }
        Some(_) => info!("market data API key configured"),
    }

    info!(
        history_days = config.history_days,
        requests_per_minute = config.requests_per_minute,
        requests_per_day = config.requests_per_day,
        seeded_jitter = config.jitter_seed.is_some(),
        "Analyzer configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config)?);

    // ── 3. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening. Press Ctrl+C to stop.");

    // ── 4. Serve until Ctrl+C ────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => warn!("Shutdown signal received — stopping gracefully"),
                Err(e) => {
                    error!(error = %e, "failed to listen for Ctrl+C, serving until killed");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
        .context("API server failed")?;

    info!(
        analyses_served = state.analyses_served(),
        uptime_secs = state.uptime_secs(),
        "Stock Analyzer shut down complete."
    );
    Ok(())
}
