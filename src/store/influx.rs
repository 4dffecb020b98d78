//! InfluxDB v2 reading source.
//!
//! Issues Flux queries against `/api/v2/query` and reads the `_value` column
//! out of the CSV response.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use super::ReadingSource;
use crate::config::InfluxConfig;

// ---

#[derive(Debug, Clone)]
pub struct InfluxSource {
    client: reqwest::Client,
    cfg: InfluxConfig,
    lookback: Duration,
}

impl InfluxSource {
    pub fn new(cfg: InfluxConfig, lookback: Duration) -> Result<Self> {
        // ---
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow!("Failed to build InfluxDB HTTP client: {}", e))?;
        Ok(Self {
            client,
            cfg,
            lookback,
        })
    }

    /// Run a Flux query and return the raw CSV body.
    async fn query(&self, flux: String) -> Result<String> {
        // ---
        let url = format!("{}/api/v2/query", self.cfg.url.trim_end_matches('/'));
        tracing::trace!("Flux query: {}", flux);

        let mut request = self
            .client
            .post(&url)
            .query(&[("org", self.cfg.org.as_str())])
            .header(CONTENT_TYPE, "application/vnd.flux")
            .header(ACCEPT, "application/csv")
            .body(flux);
        if !self.cfg.token.is_empty() {
            request = request.header(AUTHORIZATION, format!("Token {}", self.cfg.token));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("InfluxDB request to {} failed", url))?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            bail!("InfluxDB query failed ({}): {}", status, body.trim());
        }
        Ok(body)
    }
}

impl ReadingSource for InfluxSource {
    async fn fetch_sensor_ids(&self) -> Result<Vec<String>> {
        // ---
        let flux = tag_values_query(&self.cfg.bucket, &self.cfg.station_tag);
        let body = self.query(flux).await?;
        let ids = value_column(&body)?;
        tracing::debug!("InfluxDB reports {} sensors", ids.len());
        Ok(ids)
    }

    async fn fetch_window(&self, sensor_id: &str, n: usize) -> Result<Vec<f64>> {
        // ---
        let flux = window_query(&self.cfg, sensor_id, n, self.lookback);
        let body = self.query(flux).await?;

        let mut values = readings(&value_column(&body)?, sensor_id);
        values.truncate(n);
        Ok(values)
    }
}

/// Parse raw `_value` cells, keeping only finite numbers.
///
/// `nan` and `inf` parse as floats but are not readings; they are skipped
/// along with anything non-numeric.
fn readings(raw_values: &[String], sensor_id: &str) -> Vec<f64> {
    // ---
    let mut values = Vec::with_capacity(raw_values.len());
    for raw in raw_values {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => tracing::debug!("Sensor {}: skipping unusable value {:?}", sensor_id, raw),
        }
    }
    values
}

// ---

/// Quote a value as a Flux string literal.
fn flux_string(value: &str) -> String {
    // ---
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '$' => quoted.push_str("\\$"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn tag_values_query(bucket: &str, tag: &str) -> String {
    format!(
        "import \"influxdata/influxdb/schema\"\n\
         schema.tagValues(bucket: {}, tag: {})\n",
        flux_string(bucket),
        flux_string(tag)
    )
}

fn window_query(cfg: &InfluxConfig, sensor_id: &str, n: usize, lookback: Duration) -> String {
    format!(
        "from(bucket: {bucket})\n  \
         |> range(start: -{secs}s)\n  \
         |> filter(fn: (r) => r._measurement == {measurement} and r[{tag}] == {id})\n  \
         |> sort(columns: [\"_time\"], desc: true)\n  \
         |> limit(n: {n})\n",
        bucket = flux_string(&cfg.bucket),
        secs = lookback.as_secs().max(1),
        measurement = flux_string(&cfg.measurement),
        tag = flux_string(&cfg.station_tag),
        id = flux_string(sensor_id),
        n = n,
    )
}

/// Collect the `_value` column of every table in a Flux CSV response.
///
/// Each table starts with its own header row; annotation rows (`#...`) are
/// skipped. An `error` header means the query failed server side.
fn value_column(body: &str) -> Result<Vec<String>> {
    // ---
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(body.as_bytes());

    let mut value_idx: Option<usize> = None;
    let mut error_idx: Option<usize> = None;
    let mut values = Vec::new();

    for record in reader.records() {
        let record = record.context("Malformed CSV in InfluxDB response")?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let is_header = record.iter().any(|f| f == "_value")
            || (record.iter().any(|f| f == "error") && record.iter().any(|f| f == "reference"));
        if is_header {
            value_idx = record.iter().position(|f| f == "_value");
            error_idx = record.iter().position(|f| f == "error");
            continue;
        }

        if let Some(idx) = error_idx {
            bail!(
                "InfluxDB query error: {}",
                record.get(idx).unwrap_or_default()
            );
        }
        if let Some(value) = value_idx.and_then(|idx| record.get(idx)) {
            values.push(value.to_string());
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn test_config() -> InfluxConfig {
        // ---
        InfluxConfig {
            url: "http://localhost:8086".into(),
            token: String::new(),
            org: "univaq".into(),
            bucket: "sensor_data".into(),
            measurement: "mqtt_traffic_data".into(),
            station_tag: "station_id".into(),
        }
    }

    #[test]
    fn test_value_column_multiple_tables() {
        // ---
        let body = ",result,table,_start,_stop,_time,_value,_field,_measurement,station_id\r\n\
            ,_result,0,2025-01-01T00:00:00Z,2025-01-01T02:00:00Z,2025-01-01T01:59:00Z,312,value,mqtt_traffic_data,400001\r\n\
            ,_result,0,2025-01-01T00:00:00Z,2025-01-01T02:00:00Z,2025-01-01T01:58:00Z,305.5,value,mqtt_traffic_data,400001\r\n\
            \r\n\
            ,result,table,_start,_stop,_time,_value,_field,_measurement,station_id\r\n\
            ,_result,1,2025-01-01T00:00:00Z,2025-01-01T02:00:00Z,2025-01-01T01:57:00Z,299,value,mqtt_traffic_data,400001\r\n";

        assert_eq!(value_column(body).unwrap(), ["312", "305.5", "299"]);
    }

    #[test]
    fn test_value_column_with_annotations() {
        // ---
        let body = "#datatype,string,long,string\n\
            #group,false,false,false\n\
            #default,_result,,\n\
            ,result,table,_value\n\
            ,,0,400001\n\
            ,,0,400017\n";

        assert_eq!(value_column(body).unwrap(), ["400001", "400017"]);
    }

    #[test]
    fn test_value_column_empty_body() {
        // ---
        assert!(value_column("").unwrap().is_empty());
        assert!(value_column("\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_value_column_error_table() {
        // ---
        let body = ",error,reference\n,bucket not found,\n";
        let err = value_column(body).unwrap_err();
        assert!(err.to_string().contains("bucket not found"));
    }

    #[test]
    fn test_readings_skip_non_finite_values() {
        // ---
        let body = ",result,table,_time,_value\n\
            ,_result,0,2025-01-01T01:59:00Z,nan\n\
            ,_result,0,2025-01-01T01:58:00Z,312\n\
            ,_result,0,2025-01-01T01:57:00Z,inf\n\
            ,_result,0,2025-01-01T01:56:00Z,-inf\n\
            ,_result,0,2025-01-01T01:55:00Z,NaN\n\
            ,_result,0,2025-01-01T01:54:00Z,\n\
            ,_result,0,2025-01-01T01:53:00Z,n/a\n\
            ,_result,0,2025-01-01T01:52:00Z,305.5\n";

        let values = readings(&value_column(body).unwrap(), "400001");
        assert_eq!(values, [312.0, 305.5]);
    }

    #[test]
    fn test_flux_string_escaping() {
        // ---
        assert_eq!(flux_string("400001"), "\"400001\"");
        assert_eq!(flux_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(flux_string("c:\\x"), "\"c:\\\\x\"");
        assert_eq!(flux_string("${x}"), "\"\\${x}\"");
    }

    #[test]
    fn test_window_query_shape() {
        // ---
        let flux = window_query(&test_config(), "400001", 11, Duration::from_secs(7200));

        assert!(flux.contains("from(bucket: \"sensor_data\")"));
        assert!(flux.contains("range(start: -7200s)"));
        assert!(flux.contains("r._measurement == \"mqtt_traffic_data\""));
        assert!(flux.contains("r[\"station_id\"] == \"400001\""));
        assert!(flux.contains("sort(columns: [\"_time\"], desc: true)"));
        assert!(flux.contains("limit(n: 11)"));
    }

    #[test]
    fn test_tag_values_query_shape() {
        // ---
        let flux = tag_values_query("sensor_data", "station_id");
        assert!(flux.starts_with("import \"influxdata/influxdb/schema\""));
        assert!(flux.contains("schema.tagValues(bucket: \"sensor_data\", tag: \"station_id\")"));
    }
}
