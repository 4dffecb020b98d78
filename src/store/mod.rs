//! Reading sources: where sensor IDs and reading windows come from.
//!
//! The cycle only sees the [`ReadingSource`] trait, so it can run against
//! InfluxDB, PostgreSQL, or canned data in tests. Sources are read-only; the
//! write path belongs to the ingestion side.

use std::future::Future;

use anyhow::Result;

use crate::config::{Config, StoreConfig};

mod influx;
mod postgres;
mod schema;

pub use influx::InfluxSource;
pub use postgres::PostgresSource;

// ---

/// Read access to stored sensor readings.
pub trait ReadingSource: Send + Sync {
    /// Distinct sensor identifiers currently present in the store.
    fn fetch_sensor_ids(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Up to `n` most recent readings of one sensor, newest first.
    fn fetch_window(
        &self,
        sensor_id: &str,
        n: usize,
    ) -> impl Future<Output = Result<Vec<f64>>> + Send;
}

/// The reading source selected by configuration.
#[derive(Debug, Clone)]
pub enum Store {
    Influx(InfluxSource),
    Postgres(PostgresSource),
}

impl Store {
    /// Build the configured source.
    ///
    /// Connecting to PostgreSQL (and creating its schema) happens here, so a
    /// bad `DATABASE_URL` fails at startup.
    pub async fn connect(cfg: &Config) -> Result<Self> {
        // ---
        match &cfg.store {
            StoreConfig::Influx(influx) => {
                tracing::info!("Using InfluxDB reading source at {}", influx.url);
                Ok(Store::Influx(InfluxSource::new(influx.clone(), cfg.lookback)?))
            }
            StoreConfig::Postgres {
                db_url,
                db_pool_max,
            } => {
                let source = PostgresSource::connect(db_url, *db_pool_max, cfg.lookback).await?;
                Ok(Store::Postgres(source))
            }
        }
    }
}

impl ReadingSource for Store {
    async fn fetch_sensor_ids(&self) -> Result<Vec<String>> {
        match self {
            Store::Influx(source) => source.fetch_sensor_ids().await,
            Store::Postgres(source) => source.fetch_sensor_ids().await,
        }
    }

    async fn fetch_window(&self, sensor_id: &str, n: usize) -> Result<Vec<f64>> {
        match self {
            Store::Influx(source) => source.fetch_window(sensor_id, n).await,
            Store::Postgres(source) => source.fetch_window(sensor_id, n).await,
        }
    }
}
