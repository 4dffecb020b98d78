//! One fetch → classify pass across all known sensors.
//!
//! The cycle is the only place that talks to the reading source. It produces
//! a [`Report`]; turning that report into tables, maps or pages is left to
//! the renderers.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::analysis::{classify_trend, congestion_score, suggest_action};
use crate::config::CycleConfig;
use crate::metadata::MetadataTable;
use crate::store::ReadingSource;
use crate::{Report, ReportRow, SensorMeta, Window};

// ---

/// Fetch every sensor's window and build this cycle's report.
///
/// Non-finite readings are dropped from each window. Sensors without
/// metadata, with fewer than two usable readings, or whose window could not
/// be fetched are left out; the rest of the cycle carries on.
/// Failing to list the sensors fails the whole cycle.
pub async fn run_cycle<S>(source: &S, metadata: &MetadataTable, cfg: &CycleConfig) -> Result<Report>
where
    S: ReadingSource,
{
    // ---
    let sensor_ids = source
        .fetch_sensor_ids()
        .await
        .context("Failed to list sensor IDs")?;
    debug!("Cycle starting for {} sensors", sensor_ids.len());

    let mut rows = Vec::with_capacity(sensor_ids.len());
    for sensor_id in sensor_ids {
        let Some(meta) = metadata.get(&sensor_id) else {
            debug!("Sensor {}: no metadata row, skipped", sensor_id);
            continue;
        };

        let mut values = match source.fetch_window(&sensor_id, cfg.window_size()).await {
            Ok(values) => values,
            Err(e) => {
                warn!("Sensor {}: failed to fetch readings: {:#}", sensor_id, e);
                continue;
            }
        };

        let fetched = values.len();
        values.retain(|v| v.is_finite());
        if values.len() < fetched {
            debug!("Sensor {}: dropped {} non-finite readings", sensor_id, fetched - values.len());
        }

        let Some(window) = Window::from_newest_first(values) else {
            debug!("Sensor {}: fewer than 2 readings, skipped", sensor_id);
            continue;
        };

        rows.push(build_row(sensor_id, window, meta));
    }

    info!("Cycle complete, {} sensors reported", rows.len());
    Ok(Report::new(rows))
}

/// Derive trend, score and action for one sensor and join its metadata.
pub fn build_row(sensor_id: String, window: Window, meta: &SensorMeta) -> ReportRow {
    // ---
    let trend = classify_trend(window.latest, &window.previous);
    let score = congestion_score(window.latest, &window.previous);
    let action = suggest_action(window.latest, &window.previous, trend);

    ReportRow {
        sensor_id,
        latest: window.latest,
        previous: window.previous,
        trend,
        congestion_score: score,
        action,
        lat: meta.lat,
        lng: meta.lng,
        freeway: meta.freeway.clone(),
        direction: meta.direction.clone(),
    }
}
