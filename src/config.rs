//! Configuration loader for the traffic trend processes.
//!
//! This module centralizes all runtime configuration values and their defaults.
//! Values come from a key lookup function: the binaries pass the process
//! environment (with optional `.env` support provided by the caller), tests
//! pass a plain map. Nothing outside this module calls `env::var` for
//! application settings, and every setting reaches the rest of the crate
//! through the structs defined here.
//!
use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{anyhow, bail, Result};

/// Parse an optional integer setting with a default value.
macro_rules! parse_u32 {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional string setting with a default value.
macro_rules! string_or {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name).unwrap_or_else(|| String::from($default))
    };
}

/// Parse a required string setting.
macro_rules! require {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Which time-series backend the monitor and dashboard read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    // ---
    /// InfluxDB v2 queried with Flux over HTTP.
    Influx(InfluxConfig),

    /// PostgreSQL table of readings.
    Postgres {
        /// PostgreSQL connection string.
        db_url: String,
        /// Maximum number of database connections in the pool.
        db_pool_max: u32,
    },
}

/// Connection settings for the InfluxDB reading source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
    /// Tag carrying the sensor identifier.
    pub station_tag: String,
}

/// Strongly typed configuration shared by the monitor and the dashboard.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    pub store: StoreConfig,

    /// Number of history points behind the latest reading (N in N+1).
    pub history_length: usize,

    /// How far back the store is asked to look for readings.
    pub lookback: Duration,

    /// Pause between monitor cycles, and the dashboard's browser refresh.
    pub refresh_interval: Duration,

    /// Sensor metadata reference table.
    pub meta_file: PathBuf,

    /// Map document written by the monitor every cycle.
    pub map_file: PathBuf,

    /// Maximum rows shown per table panel.
    pub display_limit: usize,

    /// Bind address of the dashboard server.
    pub dashboard_addr: SocketAddr,
}

/// The subset of [`Config`] the fetch-compute cycle needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleConfig {
    pub history_length: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self { history_length: 10 }
    }
}

impl CycleConfig {
    /// Readings requested per sensor: the history plus the latest one.
    pub fn window_size(&self) -> usize {
        self.history_length + 1
    }
}

/// Load [`Config`] from the process environment.
pub fn load_from_env() -> Result<Config> {
    load_from(|key| env::var(key).ok())
}

/// Load [`Config`] from an arbitrary key lookup.
///
/// Required:
/// - `DATABASE_URL` – only when `READING_STORE=postgres`
///
/// Everything else is optional; see the field docs on [`Config`] and
/// [`InfluxConfig`] for meaning. Returns an error if any value is present
/// but invalid.
pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let store = match string_or!(lookup, "READING_STORE", "influx")
        .to_ascii_lowercase()
        .as_str()
    {
        "influx" | "influxdb" => StoreConfig::Influx(InfluxConfig {
            url: string_or!(lookup, "INFLUX_URL", "http://localhost:8086"),
            token: string_or!(lookup, "INFLUX_TOKEN", ""),
            org: string_or!(lookup, "INFLUX_ORG", "univaq"),
            bucket: string_or!(lookup, "INFLUX_BUCKET", "sensor_data"),
            measurement: string_or!(lookup, "INFLUX_MEASUREMENT", "mqtt_traffic_data"),
            station_tag: string_or!(lookup, "STATION_TAG", "station_id"),
        }),
        "postgres" | "postgresql" => StoreConfig::Postgres {
            db_url: require!(lookup, "DATABASE_URL"),
            db_pool_max: parse_u32!(lookup, "DB_POOL_MAX", 5),
        },
        other => bail!("Invalid READING_STORE: {other} (expected influx or postgres)"),
    };

    let history_length = parse_u32!(lookup, "HISTORY_LENGTH", 10) as usize;
    if history_length == 0 {
        bail!("Invalid HISTORY_LENGTH: must be at least 1");
    }
    let lookback_minutes = parse_u32!(lookup, "LOOKBACK_MINUTES", 120);
    let refresh_secs = parse_u32!(lookup, "REFRESH_INTERVAL_SECONDS", 60);
    let display_limit = parse_u32!(lookup, "DISPLAY_LIMIT", 20) as usize;

    let dashboard_addr = string_or!(lookup, "DASHBOARD_ADDR", "0.0.0.0:8080");
    let dashboard_addr = dashboard_addr
        .parse::<SocketAddr>()
        .map_err(|e| anyhow!("Invalid DASHBOARD_ADDR '{}': {}", dashboard_addr, e))?;

    Ok(Config {
        store,
        history_length,
        lookback: Duration::from_secs(u64::from(lookback_minutes) * 60),
        refresh_interval: Duration::from_secs(u64::from(refresh_secs.max(1))),
        meta_file: string_or!(lookup, "META_FILE", "sensors_data/ca_meta.csv").into(),
        map_file: string_or!(lookup, "MAP_FILE", "traffic_map.html").into(),
        display_limit,
        dashboard_addr,
    })
}

impl Config {
    /// Cycle parameters derived from this configuration.
    pub fn cycle(&self) -> CycleConfig {
        CycleConfig {
            history_length: self.history_length,
        }
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password and the InfluxDB token.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        match &self.store {
            StoreConfig::Influx(influx) => {
                tracing::info!("  READING_STORE    : influx");
                tracing::info!("  INFLUX_URL       : {}", influx.url);
                tracing::info!("  INFLUX_TOKEN     : {}", mask_secret(&influx.token));
                tracing::info!("  INFLUX_ORG       : {}", influx.org);
                tracing::info!("  INFLUX_BUCKET    : {}", influx.bucket);
                tracing::info!("  INFLUX_MEASUREMENT: {}", influx.measurement);
                tracing::info!("  STATION_TAG      : {}", influx.station_tag);
            }
            StoreConfig::Postgres {
                db_url,
                db_pool_max,
            } => {
                tracing::info!("  READING_STORE    : postgres");
                tracing::info!("  DATABASE_URL     : {}", mask_db_url(db_url));
                tracing::info!("  DB_POOL_MAX      : {}", db_pool_max);
            }
        }
        tracing::info!("  HISTORY_LENGTH   : {}", self.history_length);
        tracing::info!("  LOOKBACK         : {}s", self.lookback.as_secs());
        tracing::info!("  REFRESH_INTERVAL : {}s", self.refresh_interval.as_secs());
        tracing::info!("  META_FILE        : {}", self.meta_file.display());
        tracing::info!("  MAP_FILE         : {}", self.map_file.display());
        tracing::info!("  DISPLAY_LIMIT    : {}", self.display_limit);
        tracing::info!("  DASHBOARD_ADDR   : {}", self.dashboard_addr);
    }
}

// ---

/// Settings of the sensor replay producer.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    // ---
    pub broker_address: String,
    pub broker_port: u16,

    /// Mutual-TLS credential set, PEM encoded.
    pub ca_cert_path: PathBuf,
    pub client_cert_path: PathBuf,
    pub client_key_path: PathBuf,

    /// Historical readings replayed row by row.
    pub csv_file: PathBuf,

    pub publish_interval: Duration,

    /// Maximum number of station columns replayed.
    pub n_stations: usize,

    /// Topics are `<topic_prefix>/<station id>`.
    pub topic_prefix: String,

    pub client_id: String,
}

/// Load [`ProducerConfig`] from the process environment.
pub fn load_producer_from_env() -> Result<ProducerConfig> {
    load_producer_from(|key| env::var(key).ok())
}

/// Load [`ProducerConfig`] from an arbitrary key lookup.
pub fn load_producer_from<F>(lookup: F) -> Result<ProducerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let broker_port = parse_u32!(lookup, "BROKER_PORT", 8883);
    let broker_port = u16::try_from(broker_port)
        .map_err(|_| anyhow!("Invalid BROKER_PORT: {} is out of range", broker_port))?;

    let topic_prefix = string_or!(lookup, "TOPIC_PREFIX", "sensors")
        .trim_end_matches('/')
        .to_string();

    Ok(ProducerConfig {
        broker_address: string_or!(lookup, "BROKER_ADDRESS", "localhost"),
        broker_port,
        ca_cert_path: string_or!(lookup, "CA_CERT_PATH", "/creds/ca.pem").into(),
        client_cert_path: string_or!(lookup, "CLIENT_CERT_PATH", "/creds/cert.pem").into(),
        client_key_path: string_or!(lookup, "CLIENT_KEY_PATH", "/creds/key.pem").into(),
        csv_file: string_or!(lookup, "CSV_FILE", "data_ca_his_10days_2021.csv").into(),
        publish_interval: Duration::from_secs(u64::from(parse_u32!(
            lookup,
            "PUBLISH_INTERVAL_SECONDS",
            5
        ))),
        n_stations: parse_u32!(lookup, "N_STATIONS", 5) as usize,
        topic_prefix,
        client_id: string_or!(lookup, "MQTT_CLIENT_ID", "traffic-producer"),
    })
}

impl ProducerConfig {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Producer configuration loaded:");
        tracing::info!("  BROKER           : {}:{}", self.broker_address, self.broker_port);
        tracing::info!("  CA_CERT_PATH     : {}", self.ca_cert_path.display());
        tracing::info!("  CLIENT_CERT_PATH : {}", self.client_cert_path.display());
        tracing::info!("  CLIENT_KEY_PATH  : {}", self.client_key_path.display());
        tracing::info!("  CSV_FILE         : {}", self.csv_file.display());
        tracing::info!("  PUBLISH_INTERVAL : {}s", self.publish_interval.as_secs());
        tracing::info!("  N_STATIONS       : {}", self.n_stations);
        tracing::info!("  TOPIC_PREFIX     : {}", self.topic_prefix);
        tracing::info!("  MQTT_CLIENT_ID   : {}", self.client_id);
    }
}

// ---

/// Mask the password in a connection URL such as `postgres://u:p@host/db`.
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `scheme://user@host` has no password, only the scheme colon
            if !db_url[colon_pos..].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

fn mask_secret(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(unset)"
    } else {
        "****"
    }
}
