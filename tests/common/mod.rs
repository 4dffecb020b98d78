//! Canned reading source shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Result};
use traffic_trend::store::ReadingSource;
use traffic_trend::{MetadataTable, SensorMeta};

// ---

#[derive(Default)]
pub struct FakeSource {
    ids: Vec<String>,
    windows: HashMap<String, Vec<f64>>,
    failing: Vec<String>,
    listing_fails: bool,
    pub window_requests: AtomicUsize,
    pub last_window_size: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensor with readings ordered newest first.
    pub fn with_sensor(mut self, id: &str, newest_first: &[f64]) -> Self {
        self.ids.push(id.to_string());
        self.windows.insert(id.to_string(), newest_first.to_vec());
        self
    }

    /// Register a sensor whose window fetch fails.
    pub fn with_failing_sensor(mut self, id: &str) -> Self {
        self.ids.push(id.to_string());
        self.failing.push(id.to_string());
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }
}

impl ReadingSource for FakeSource {
    async fn fetch_sensor_ids(&self) -> Result<Vec<String>> {
        if self.listing_fails {
            bail!("store unreachable");
        }
        Ok(self.ids.clone())
    }

    async fn fetch_window(&self, sensor_id: &str, n: usize) -> Result<Vec<f64>> {
        self.window_requests.fetch_add(1, Ordering::SeqCst);
        self.last_window_size.store(n, Ordering::SeqCst);
        if self.failing.iter().any(|id| id == sensor_id) {
            bail!("timeout fetching {}", sensor_id);
        }
        let mut values = self.windows.get(sensor_id).cloned().unwrap_or_default();
        values.truncate(n);
        Ok(values)
    }
}

pub fn meta(id: &str, lat: f64, lng: f64) -> SensorMeta {
    SensorMeta {
        id: id.to_string(),
        lat,
        lng,
        freeway: "101".to_string(),
        direction: "N".to_string(),
    }
}

pub fn metadata_for(ids: &[&str]) -> MetadataTable {
    MetadataTable::from_rows(
        ids.iter()
            .enumerate()
            .map(|(i, id)| meta(id, 37.0 + i as f64 * 0.1, -121.9)),
    )
}
