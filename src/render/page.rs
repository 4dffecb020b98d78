//! The live dashboard page.
//!
//! A full page is rebuilt from the report on every request; the browser
//! reloads it on a fixed timer through `<meta http-equiv="refresh">`.

use std::fmt::Write;
use std::time::Duration;

use super::escape_html;
use super::map::{leaflet_head, marker_color, MapView};
use super::table::{format_reading, format_score};
use crate::Report;

const TITLE: &str = "Live Traffic Monitor";

// ---

/// Page layout settings, fixed for the lifetime of the dashboard.
#[derive(Debug, Clone, Copy)]
pub struct DashboardPage {
    pub refresh: Duration,
    pub display_limit: usize,
}

impl DashboardPage {
    pub fn new(refresh: Duration, display_limit: usize) -> Self {
        Self {
            refresh,
            display_limit,
        }
    }

    /// Render the status panel, suggested actions and map for a report.
    pub fn render(&self, report: &Report) -> String {
        // ---
        let mut left = String::new();
        left.push_str("<h2>Live Sensor Status</h2>\n");
        if report.is_empty() {
            left.push_str(r#"<p class="info">No data available</p>"#);
        } else {
            left.push_str(&self.status_panel(report));
        }

        left.push_str("\n<h2>Suggested Actions</h2>\n");
        if report.is_empty() {
            left.push_str(r#"<p class="info">No data available</p>"#);
        } else {
            left.push_str(&self.advisory_panel(report));
        }

        let mut right = String::from("<h2>Traffic Map</h2>\n");
        if report.is_empty() {
            right.push_str(r#"<p class="info">Map will appear once data is available</p>"#);
        } else {
            right.push_str(&MapView::fitted(report).html_fragment("map", 500));
        }

        let footer = format!(
            "Updated {} UTC, {} sensors reported",
            report.generated_at.format("%Y-%m-%d %H:%M:%S"),
            report.rows.len()
        );
        self.layout(&left, &right, &footer)
    }

    /// Render the page for a cycle that failed; the timer keeps running so the
    /// next refresh tries again.
    pub fn render_error(&self, message: &str) -> String {
        // ---
        let left = format!(
            "<h2>Live Sensor Status</h2>\n<p class=\"error\">Could not load sensor data: {}</p>",
            escape_html(message)
        );
        let right = String::from(
            "<h2>Traffic Map</h2>\n<p class=\"info\">Map will appear once data is available</p>",
        );
        self.layout(&left, &right, "Retrying on next refresh")
    }

    fn status_panel(&self, report: &Report) -> String {
        // ---
        let mut html = String::from(
            "<table>\n<tr><th>Sensor ID</th><th>Latest Value</th><th>Trend</th>\
             <th>Score %</th><th>Previous Readings</th></tr>\n",
        );
        for row in report.status(self.display_limit) {
            let previous: Vec<String> = row.previous.iter().map(|v| format_reading(*v)).collect();
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td style=\"color: {}\">{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&row.sensor_id),
                format_reading(row.latest),
                marker_color(Some(row.trend)),
                row.trend,
                format_score(row.congestion_score),
                previous.join(", "),
            );
        }
        html.push_str("</table>");
        html
    }

    fn advisory_panel(&self, report: &Report) -> String {
        // ---
        let mut html = String::from("<ol class=\"advice\">\n");
        for row in report.advisories(self.display_limit) {
            let _ = writeln!(
                html,
                "<li><b>{}</b> ({}) {}%: {}</li>",
                escape_html(&row.sensor_id),
                escape_html(&row.road()),
                format_score(row.congestion_score),
                escape_html(row.action.message()),
            );
        }
        html.push_str("</ol>");
        html
    }

    fn layout(&self, left: &str, right: &str, footer: &str) -> String {
        // ---
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh}">
<title>{title}</title>
{head}
<style>
body {{ font-family: sans-serif; margin: 1.5rem; }}
.columns {{ display: flex; gap: 2rem; }}
.left {{ flex: 1; }}
.right {{ flex: 1.2; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.5rem; text-align: left; }}
.info {{ background: #eef4fb; padding: 0.6rem; }}
.error {{ background: #fbeeee; padding: 0.6rem; }}
footer {{ margin-top: 1rem; color: #666; font-size: 0.85rem; }}
</style>
</head>
<body>
<h1>Live Map Dashboard with Traffic Sensors</h1>
<div class="columns">
<div class="left">
{left}
</div>
<div class="right">
{right}
</div>
</div>
<footer>{footer}</footer>
</body>
</html>
"#,
            refresh = self.refresh.as_secs().max(1),
            title = TITLE,
            head = leaflet_head(),
            left = left,
            right = right,
            footer = escape_html(footer),
        )
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::analysis::Action;
    use crate::{ReportRow, Trend};

    fn create_test_row(sensor_id: &str, score: f64, action: Action) -> ReportRow {
        // ---
        ReportRow {
            sensor_id: sensor_id.to_string(),
            latest: 100.0 + score,
            previous: vec![100.0, 101.0, 99.0],
            trend: Trend::Increasing,
            congestion_score: score,
            action,
            lat: 37.3,
            lng: -121.9,
            freeway: "880".into(),
            direction: "S".into(),
        }
    }

    #[test]
    fn test_refresh_meta_tag() {
        // ---
        let page = DashboardPage::new(Duration::from_secs(60), 20);
        let html = page.render(&Report::new(vec![]));
        assert!(html.contains(r#"<meta http-equiv="refresh" content="60">"#));
    }

    #[test]
    fn test_empty_report_messages() {
        // ---
        let page = DashboardPage::new(Duration::from_secs(60), 20);
        let html = page.render(&Report::new(vec![]));
        assert!(html.contains("No data available"));
        assert!(html.contains("Map will appear once data is available"));
        assert!(!html.contains("L.map("));
    }

    #[test]
    fn test_panels_and_ranking() {
        // ---
        let page = DashboardPage::new(Duration::from_secs(30), 20);
        let report = Report::new(vec![
            create_test_row("400001", 8.0, Action::RisingTraffic),
            create_test_row("400017", 31.0, Action::HighCongestion),
        ]);
        let html = page.render(&report);

        assert!(html.contains("Live Sensor Status"));
        assert!(html.contains("100, 101, 99"));
        assert!(html.contains("L.map(\"map\")"));

        let advice = &html[html.find("<ol").unwrap()..];
        let high = advice.find("400017").unwrap();
        let rising = advice.find("400001").unwrap();
        assert!(high < rising);
        assert!(advice.contains(Action::HighCongestion.message()));
    }

    #[test]
    fn test_display_limit_applies_to_both_panels() {
        // ---
        let page = DashboardPage::new(Duration::from_secs(30), 1);
        let report = Report::new(vec![
            create_test_row("400001", 8.0, Action::RisingTraffic),
            create_test_row("400017", 31.0, Action::HighCongestion),
        ]);
        let html = page.render(&report);

        let table = &html[html.find("<table>").unwrap()..html.find("</table>").unwrap()];
        assert!(table.contains("400001") && !table.contains("400017"));

        let advice = &html[html.find("<ol").unwrap()..html.find("</ol>").unwrap()];
        assert!(advice.contains("400017") && !advice.contains("400001"));
    }

    #[test]
    fn test_error_page() {
        // ---
        let page = DashboardPage::new(Duration::from_secs(60), 20);
        let html = page.render_error("connection refused <influx>");
        assert!(html.contains("Could not load sensor data: connection refused &lt;influx&gt;"));
        assert!(html.contains(r#"content="60""#));
    }
}
