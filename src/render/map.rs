//! Map view: one circle marker per reported sensor, coloured by trend.
//!
//! The rendered document is plain HTML that loads Leaflet from a CDN; the
//! marker data is embedded as JSON so the page needs no server round trip.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::escape_html;
use super::table::{format_reading, format_score};
use crate::{Report, ReportRow, Trend};

/// Fixed centre used by the batch monitor (California).
pub const CALIFORNIA_CENTER: (f64, f64) = (37.5, -121.5);

const LEAFLET_VERSION: &str = "1.9.4";

// ---

/// Marker colour for a trend; `None` stands for a trend label that could
/// not be recognised.
pub fn marker_color(trend: Option<Trend>) -> &'static str {
    match trend {
        Some(Trend::Increasing) => "red",
        Some(Trend::Decreasing) => "blue",
        Some(Trend::Normal) => "green",
        None => "gray",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    // ---
    pub lat: f64,
    pub lng: f64,
    pub radius: u32,
    pub color: &'static str,
    /// Popup body, already HTML-escaped.
    pub popup: String,
}

impl MapMarker {
    pub fn from_row(row: &ReportRow, radius: u32) -> Self {
        // ---
        let popup = format!(
            "<b>Sensor:</b> {}<br><b>Latest:</b> {}<br><b>Trend:</b> {}<br>\
             <b>Score:</b> {}%<br><b>Road:</b> {}",
            escape_html(&row.sensor_id),
            format_reading(row.latest),
            row.trend,
            format_score(row.congestion_score),
            escape_html(&row.road()),
        );

        Self {
            lat: row.lat,
            lng: row.lng,
            radius,
            color: marker_color(Some(row.trend)),
            popup,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    // ---
    pub center: (f64, f64),
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// Map with a caller-chosen centre, as the batch monitor draws it.
    pub fn with_center(report: &Report, center: (f64, f64), zoom: u8) -> Self {
        Self {
            center,
            zoom,
            markers: report.rows.iter().map(|r| MapMarker::from_row(r, 6)).collect(),
        }
    }

    /// Map centred on the mean position of the reported sensors.
    ///
    /// Falls back to [`CALIFORNIA_CENTER`] when nothing is reported.
    pub fn fitted(report: &Report) -> Self {
        // ---
        let center = if report.is_empty() {
            CALIFORNIA_CENTER
        } else {
            let n = report.rows.len() as f64;
            let lat = report.rows.iter().map(|r| r.lat).sum::<f64>() / n;
            let lng = report.rows.iter().map(|r| r.lng).sum::<f64>() / n;
            (lat, lng)
        };

        Self {
            center,
            zoom: 10,
            markers: report.rows.iter().map(|r| MapMarker::from_row(r, 7)).collect(),
        }
    }

    /// The `<div>` plus script that draws this map into an element with `id`.
    pub fn html_fragment(&self, id: &str, height_px: u32) -> String {
        // ---
        // `</` inside the JSON would close the script element early
        let markers = serde_json::to_string(&self.markers)
            .unwrap_or_else(|_| String::from("[]"))
            .replace("</", "<\\/");

        format!(
            r#"<div id="{id}" style="height: {height_px}px; width: 100%;"></div>
<script>
(function () {{
  var map = L.map("{id}").setView([{lat}, {lng}], {zoom});
  L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
    maxZoom: 19,
    attribution: "&copy; OpenStreetMap contributors"
  }}).addTo(map);
  var markers = {markers};
  markers.forEach(function (m) {{
    L.circleMarker([m.lat, m.lng], {{
      radius: m.radius,
      color: m.color,
      fill: true,
      fillColor: m.color,
      fillOpacity: 0.8
    }}).bindPopup(m.popup).addTo(map);
  }});
}})();
</script>"#,
            id = escape_html(id),
            height_px = height_px,
            lat = self.center.0,
            lng = self.center.1,
            zoom = self.zoom,
            markers = markers,
        )
    }

    /// A complete standalone HTML document.
    pub fn to_html_document(&self, title: &str) -> String {
        // ---
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
{head}
<style>html, body {{ height: 100%; margin: 0; }}</style>
</head>
<body>
{map}
</body>
</html>
"#,
            title = escape_html(title),
            head = leaflet_head(),
            map = self.html_fragment("map", 900),
        )
    }

    /// Write the standalone document, replacing any previous one.
    pub fn write_document(&self, path: &Path, title: &str) -> Result<()> {
        // ---
        std::fs::write(path, self.to_html_document(title))
            .with_context(|| format!("Failed to write map file '{}'", path.display()))
    }
}

/// `<link>`/`<script>` tags that load Leaflet.
pub fn leaflet_head() -> String {
    format!(
        r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@{v}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{v}/dist/leaflet.js"></script>"#,
        v = LEAFLET_VERSION
    )
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::analysis::Action;

    fn create_test_row(sensor_id: &str, trend: Trend, lat: f64, lng: f64) -> ReportRow {
        // ---
        ReportRow {
            sensor_id: sensor_id.to_string(),
            latest: 120.0,
            previous: vec![100.0; 10],
            trend,
            congestion_score: 20.0,
            action: Action::RisingTraffic,
            lat,
            lng,
            freeway: "101".into(),
            direction: "N".into(),
        }
    }

    #[test]
    fn test_marker_colors() {
        // ---
        assert_eq!(marker_color(Some(Trend::Increasing)), "red");
        assert_eq!(marker_color(Some(Trend::Decreasing)), "blue");
        assert_eq!(marker_color(Some(Trend::Normal)), "green");
        assert_eq!(marker_color(None), "gray");
        assert_eq!(marker_color(Trend::from_label("Sideways")), "gray");
    }

    #[test]
    fn test_one_marker_per_row() {
        // ---
        let report = Report::new(vec![
            create_test_row("a", Trend::Increasing, 37.0, -121.0),
            create_test_row("b", Trend::Decreasing, 38.0, -122.0),
        ]);

        let view = MapView::with_center(&report, CALIFORNIA_CENTER, 7);
        assert_eq!(view.markers.len(), 2);
        assert_eq!(view.markers[0].color, "red");
        assert_eq!(view.markers[1].color, "blue");
        assert_eq!(view.markers[0].radius, 6);
        assert_eq!(view.center, CALIFORNIA_CENTER);
        assert!(view.markers[0].popup.contains("<b>Sensor:</b> a"));
        assert!(view.markers[0].popup.contains("101 N"));
    }

    #[test]
    fn test_fitted_center() {
        // ---
        let report = Report::new(vec![
            create_test_row("a", Trend::Normal, 37.0, -121.0),
            create_test_row("b", Trend::Normal, 38.0, -122.0),
        ]);
        let view = MapView::fitted(&report);
        assert_eq!(view.center, (37.5, -121.5));
        assert_eq!(view.zoom, 10);

        let empty = MapView::fitted(&Report::new(vec![]));
        assert_eq!(empty.center, CALIFORNIA_CENTER);
        assert!(empty.markers.is_empty());
    }

    #[test]
    fn test_popup_is_escaped() {
        // ---
        let row = create_test_row("<script>x</script>", Trend::Normal, 37.0, -121.0);
        let marker = MapMarker::from_row(&row, 6);
        assert!(!marker.popup.contains("<script>"));

        let view = MapView::with_center(&Report::new(vec![row]), CALIFORNIA_CENTER, 7);
        let html = view.to_html_document("Traffic");
        assert!(!html.contains("</script>x"));
    }

    #[test]
    fn test_write_document() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traffic_map.html");
        let report = Report::new(vec![create_test_row("400001", Trend::Increasing, 37.3, -121.9)]);

        MapView::with_center(&report, CALIFORNIA_CENTER, 7)
            .write_document(&path, "Live Traffic Map")
            .unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("leaflet.js"));
        assert!(html.contains("setView([37.5, -121.5], 7)"));
        assert!(html.contains("\"color\":\"red\""));
    }
}
