//! Live dashboard for the traffic trend pipeline.
//!
//! Startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Loading the sensor metadata table (fatal if missing or malformed)
//! - Connecting the configured reading source
//! - Mounting all routes via the `routes` gateway and serving on
//!   `DASHBOARD_ADDR` until Ctrl-C
//!
//! Every page load runs a fresh cycle; the page reloads itself every
//! `REFRESH_INTERVAL_SECONDS`.
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use tracing::info;

use traffic_trend::config;
use traffic_trend::render::DashboardPage;
use traffic_trend::routes::{self, AppState};
use traffic_trend::shutdown::shutdown_signal;
use traffic_trend::store::Store;
use traffic_trend::telemetry::init_tracing;
use traffic_trend::MetadataTable;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let metadata = MetadataTable::load(&cfg.meta_file)?;
    let store = Store::connect(&cfg).await?;

    let state = AppState {
        source: Arc::new(store),
        metadata: Arc::new(metadata),
        cycle: cfg.cycle(),
        page: DashboardPage::new(cfg.refresh_interval, cfg.display_limit),
    };
    let app: Router = routes::router(state);

    info!("Listening on {}", cfg.dashboard_addr);

    let listener = tokio::net::TcpListener::bind(cfg.dashboard_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Dashboard stopped");
    Ok(())
}
