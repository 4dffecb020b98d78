//! Road-sensor replay, trend classification and live traffic monitoring.
//!
//! The crate backs three independent processes:
//! - `traffic-producer` replays a historical CSV onto per-sensor MQTT topics
//! - `traffic-monitor` polls the time-series store, writes a map document and
//!   prints terminal tables every cycle
//! - `traffic-dashboard` serves the same cycle as an auto-refreshing web page
//!
//! The shared core is small: [`analysis`] classifies each sensor's window,
//! [`cycle`] fetches windows from a [`store::ReadingSource`] and builds a
//! [`Report`], and [`render`] turns a report into tables, maps and pages.
//! Modules talk to each other through the re-exports below rather than
//! reaching into siblings' internals.

pub mod analysis;
pub mod config;
pub mod cycle;
pub mod metadata;
pub mod monitor;
pub mod producer;
pub mod render;
pub mod routes;
pub mod shutdown;
pub mod store;
pub mod telemetry;

mod models;

pub use analysis::Action;
pub use config::{Config, CycleConfig, ProducerConfig};
pub use metadata::MetadataTable;
pub use models::{Report, ReportRow, SensorMeta, Trend, Window};
