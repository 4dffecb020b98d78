//! Sensor simulator: replays historical readings onto the MQTT broker.
//!
//! Every row of the replay table becomes one publish round (one message per
//! station on `<prefix>/<station id>`), followed by the configured pause.

mod history;
mod publisher;

pub use history::ReplayTable;
pub use publisher::{connect, BrokerLink, Publish};

use std::future::Future;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::ProducerConfig;

// ---

/// Why the publish loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayEnd {
    /// Every row was published.
    Exhausted,
    /// The shutdown future resolved first.
    Interrupted,
}

/// Topic a station's readings are published to.
pub fn topic_for(prefix: &str, station_id: &str) -> String {
    format!("{}/{}", prefix, station_id)
}

/// Publish every row of `table`, pausing `cfg.publish_interval` after each.
///
/// Stops early, without error, as soon as `shutdown` resolves.
pub async fn replay<P, F>(
    publisher: &P,
    table: &ReplayTable,
    cfg: &ProducerConfig,
    shutdown: F,
) -> Result<ReplayEnd>
where
    P: Publish,
    F: Future<Output = ()>,
{
    // ---
    tokio::pin!(shutdown);

    for row in 0..table.len() {
        let round = async {
            let mut sent = 0usize;
            for (station_id, payload) in table.readings(row) {
                publisher
                    .publish(&topic_for(&cfg.topic_prefix, station_id), payload)
                    .await?;
                sent += 1;
            }
            debug!("Row {}: published {} readings", row, sent);
            tokio::time::sleep(cfg.publish_interval).await;
            anyhow::Ok(())
        };

        tokio::select! {
            result = round => result?,
            _ = &mut shutdown => {
                info!("Interrupt received, stopping replay at row {}", row);
                return Ok(ReplayEnd::Interrupted);
            }
        }
    }

    info!("Replay finished after {} rows", table.len());
    Ok(ReplayEnd::Exhausted)
}
