//! Sensor simulator for the traffic trend pipeline.
//!
//! Loads the historical readings CSV, connects to the MQTT broker over
//! mutual TLS and replays one row per `PUBLISH_INTERVAL_SECONDS`. Missing
//! data or an unreachable broker ends the process with an error; Ctrl-C or
//! the end of the file ends it with an orderly disconnect.
use anyhow::Result;
use dotenvy::dotenv;
use tracing::info;

use traffic_trend::config;
use traffic_trend::producer::{self, ReplayEnd, ReplayTable};
use traffic_trend::shutdown::shutdown_signal;
use traffic_trend::telemetry::init_tracing;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_producer_from_env()?;
    cfg.log_config();

    let table = ReplayTable::load(&cfg.csv_file, cfg.n_stations)?;
    info!("Replaying stations: {}", table.station_ids().join(", "));

    let link = producer::connect(&cfg).await?;
    let outcome = producer::replay(&link, &table, &cfg, shutdown_signal()).await;
    link.disconnect().await;

    match outcome? {
        ReplayEnd::Exhausted => info!("All readings published"),
        ReplayEnd::Interrupted => info!("Producer interrupted"),
    }
    Ok(())
}
