//! One batch-monitor pass: run a cycle, rewrite the map document and build
//! the terminal frame.
//!
//! Both outputs are regenerated on every pass. A cycle that fails outright
//! still replaces them, with an empty report and the failure shown on the
//! terminal, so nothing from an earlier cycle is left on display.

use std::fmt::Write;

use tracing::error;

use crate::config::Config;
use crate::cycle::run_cycle;
use crate::metadata::MetadataTable;
use crate::render::map::{MapView, CALIFORNIA_CENTER};
use crate::render::table::monitor_screen;
use crate::store::ReadingSource;
use crate::Report;

pub const MAP_TITLE: &str = "Live Traffic Trend Map";
pub const MAP_ZOOM: u8 = 7;

// ---

/// Run one cycle, write `cfg.map_file` and return the frame to print.
pub async fn refresh<S>(source: &S, metadata: &MetadataTable, cfg: &Config) -> String
where
    S: ReadingSource,
{
    // ---
    let (report, failure) = match run_cycle(source, metadata, &cfg.cycle()).await {
        Ok(report) => (report, None),
        Err(e) => {
            error!("Cycle failed: {:#}", e);
            (Report::new(Vec::new()), Some(format!("{:#}", e)))
        }
    };

    let map = MapView::with_center(&report, CALIFORNIA_CENTER, MAP_ZOOM);
    if let Err(e) = map.write_document(&cfg.map_file, MAP_TITLE) {
        error!("{:#}", e);
    }

    let mut screen = monitor_screen(&report, cfg.display_limit, &cfg.map_file);
    if let Some(message) = failure {
        let _ = writeln!(screen, "Cycle failed: {}", message);
    }
    screen
}
