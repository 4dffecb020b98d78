//! Batch monitor for the traffic trend pipeline.
//!
//! Startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Loading the sensor metadata table (fatal if missing or malformed)
//! - Connecting the configured reading source
//!
//! Then, every `REFRESH_INTERVAL_SECONDS`: run one cycle, rewrite the map
//! document at `MAP_FILE`, and redraw the terminal tables. Ctrl-C stops the
//! loop, also in the middle of a cycle.
use anyhow::Result;
use dotenvy::dotenv;
use tracing::info;

use traffic_trend::config;
use traffic_trend::monitor;
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

    info!(
        "Live Traffic Monitor started (refresh every {}s)",
        cfg.refresh_interval.as_secs()
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            screen = monitor::refresh(&store, &metadata, &cfg) => print!("{}", screen),
            _ = &mut shutdown => break,
        }
        tokio::select! {
            _ = tokio::time::sleep(cfg.refresh_interval) => {}
            _ = &mut shutdown => break,
        }
    }

    info!("Live Traffic Monitor stopped");
    Ok(())
}
