//! Simple data models for the traffic trend pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Action;

// ---

/// Direction of a sensor's latest reading relative to its recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Normal,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Increasing => "Increasing",
            Trend::Decreasing => "Decreasing",
            Trend::Normal => "Normal",
        }
    }

    /// Parse a label produced by [`Trend::as_str`].
    ///
    /// Entry point for trend labels that arrive as text from outside the
    /// crate; unknown labels give `None`, which the map draws in gray.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Increasing" => Some(Trend::Increasing),
            "Decreasing" => Some(Trend::Decreasing),
            "Normal" => Some(Trend::Normal),
            _ => None,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The most recent readings of one sensor, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    // ---
    pub latest: f64,
    pub previous: Vec<f64>,
}

impl Window {
    /// Split readings ordered newest first into `latest` and `previous`.
    ///
    /// Returns `None` when fewer than two readings are available, since a
    /// single reading has nothing to be compared against.
    pub fn from_newest_first(mut values: Vec<f64>) -> Option<Self> {
        // ---
        if values.len() < 2 {
            return None;
        }
        let latest = values.remove(0);
        Some(Self {
            latest,
            previous: values,
        })
    }
}

/// Static location metadata of a sensor, one row of the reference table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorMeta {
    // ---
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Lat")]
    pub lat: f64,
    #[serde(rename = "Lng")]
    pub lng: f64,
    #[serde(rename = "Fwy", default)]
    pub freeway: String,
    #[serde(rename = "Direction", default)]
    pub direction: String,
}

/// One reported sensor for a single cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    // ---
    pub sensor_id: String,
    pub latest: f64,
    pub previous: Vec<f64>,
    pub trend: Trend,
    pub congestion_score: f64,
    pub action: Action,
    pub lat: f64,
    pub lng: f64,
    pub freeway: String,
    pub direction: String,
}

impl ReportRow {
    /// Road label such as `101 N`.
    pub fn road(&self) -> String {
        format!("{} {}", self.freeway, self.direction)
            .trim()
            .to_string()
    }
}

/// Everything one fetch-compute pass produced, in sensor listing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    // ---
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        Self {
            generated_at: Utc::now(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw status panel rows: insertion order, at most `limit`.
    pub fn status(&self, limit: usize) -> &[ReportRow] {
        &self.rows[..self.rows.len().min(limit)]
    }

    /// Advisory panel rows: highest congestion score first, at most `limit`.
    ///
    /// Rows with equal scores keep their insertion order.
    pub fn advisories(&self, limit: usize) -> Vec<&ReportRow> {
        // ---
        let mut ranked: Vec<&ReportRow> = self.rows.iter().collect();
        ranked.sort_by(|a, b| b.congestion_score.total_cmp(&a.congestion_score));
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn create_test_row(sensor_id: &str, score: f64) -> ReportRow {
        // ---
        ReportRow {
            sensor_id: sensor_id.to_string(),
            latest: 100.0 + score,
            previous: vec![100.0; 5],
            trend: Trend::Normal,
            congestion_score: score,
            action: Action::Stable,
            lat: 37.5,
            lng: -121.9,
            freeway: "101".to_string(),
            direction: "N".to_string(),
        }
    }

    #[test]
    fn test_window_split() {
        // ---
        let window = Window::from_newest_first(vec![5.0, 4.0, 3.0]).unwrap();
        assert_eq!(window.latest, 5.0);
        assert_eq!(window.previous, vec![4.0, 3.0]);

        let window = Window::from_newest_first(vec![5.0, 4.0]).unwrap();
        assert_eq!(window.previous, vec![4.0]);
    }

    #[test]
    fn test_window_needs_two_readings() {
        // ---
        assert_eq!(Window::from_newest_first(vec![]), None);
        assert_eq!(Window::from_newest_first(vec![42.0]), None);
    }

    #[test]
    fn test_status_keeps_insertion_order() {
        // ---
        let report = Report::new(vec![
            create_test_row("a", 1.0),
            create_test_row("b", 30.0),
            create_test_row("c", -4.0),
        ]);

        let ids: Vec<&str> = report.status(10).iter().map(|r| r.sensor_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(report.status(2).len(), 2);
        assert_eq!(report.status(0).len(), 0);
    }

    #[test]
    fn test_advisories_rank_by_score() {
        // ---
        let report = Report::new(vec![
            create_test_row("a", 1.0),
            create_test_row("b", 30.0),
            create_test_row("c", -4.0),
            create_test_row("d", 30.0),
        ]);

        let ids: Vec<&str> = report
            .advisories(10)
            .iter()
            .map(|r| r.sensor_id.as_str())
            .collect();
        assert_eq!(ids, ["b", "d", "a", "c"]);

        let top: Vec<&str> = report
            .advisories(2)
            .iter()
            .map(|r| r.sensor_id.as_str())
            .collect();
        assert_eq!(top, ["b", "d"]);
    }

    #[test]
    fn test_trend_labels() {
        // ---
        for trend in [Trend::Increasing, Trend::Decreasing, Trend::Normal] {
            assert_eq!(Trend::from_label(trend.as_str()), Some(trend));
            assert_eq!(trend.to_string(), trend.as_str());
        }
        assert_eq!(Trend::from_label("increasing"), None);
    }

    #[test]
    fn test_road_label() {
        // ---
        let mut row = create_test_row("a", 0.0);
        assert_eq!(row.road(), "101 N");
        row.direction.clear();
        assert_eq!(row.road(), "101");
    }
}
