//! Box-drawn terminal tables for the batch monitor.

use std::fmt::Write;
use std::path::Path;

use crate::{Report, ReportRow};

// ---

/// A grid of text cells with a header row.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; missing cells render empty, extra cells are dropped.
    pub fn push_row(&mut self, cells: Vec<String>) {
        // ---
        let mut cells = cells;
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        // ---
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    /// Render the table with a rule between every row.
    pub fn render(&self) -> String {
        // ---
        let widths = self.widths();
        let mut out = String::new();

        out.push_str(&rule(&widths, '╒', '═', '╤', '╕'));
        out.push_str(&line(&widths, &self.headers));
        if self.rows.is_empty() {
            out.push_str(&rule(&widths, '╘', '═', '╧', '╛'));
            return out;
        }
        out.push_str(&rule(&widths, '╞', '═', '╪', '╡'));

        for (i, row) in self.rows.iter().enumerate() {
            out.push_str(&line(&widths, row));
            if i + 1 < self.rows.len() {
                out.push_str(&rule(&widths, '├', '─', '┼', '┤'));
            }
        }
        out.push_str(&rule(&widths, '╘', '═', '╧', '╛'));
        out
    }
}

fn rule(widths: &[usize], left: char, fill: char, joint: char, right: char) -> String {
    // ---
    let mut out = String::new();
    out.push(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            out.push(joint);
        }
        out.extend(std::iter::repeat(fill).take(width + 2));
    }
    out.push(right);
    out.push('\n');
    out
}

fn line(widths: &[usize], cells: &[String]) -> String {
    // ---
    let mut out = String::from("│");
    for (width, cell) in widths.iter().zip(cells) {
        let pad = width - cell.chars().count();
        let _ = write!(out, " {}{} │", cell, " ".repeat(pad));
    }
    out.push('\n');
    out
}

// ---

/// Raw status panel: every reported sensor in listing order.
pub fn status_table(report: &Report, limit: usize) -> TextTable {
    // ---
    let mut table = TextTable::new([
        "Sensor ID", "Latest", "Trend", "Score %", "Road", "Dir", "Lat", "Lng",
    ]);
    for row in report.status(limit) {
        table.push_row(vec![
            row.sensor_id.clone(),
            format_reading(row.latest),
            row.trend.to_string(),
            format_score(row.congestion_score),
            row.freeway.clone(),
            row.direction.clone(),
            format!("{:.6}", row.lat),
            format!("{:.6}", row.lng),
        ]);
    }
    table
}

/// Suggested action panel: highest congestion first.
pub fn advisory_table(report: &Report, limit: usize) -> TextTable {
    // ---
    let mut table = TextTable::new(["#", "Sensor ID", "Road", "Trend", "Score %", "Suggested Action"]);
    for (rank, row) in report.advisories(limit).into_iter().enumerate() {
        table.push_row(advisory_cells(rank + 1, row));
    }
    table
}

fn advisory_cells(rank: usize, row: &ReportRow) -> Vec<String> {
    vec![
        rank.to_string(),
        row.sensor_id.clone(),
        row.road(),
        row.trend.to_string(),
        format_score(row.congestion_score),
        row.action.message().to_string(),
    ]
}

/// Full terminal frame for one monitor cycle, starting with a screen reset.
pub fn monitor_screen(report: &Report, limit: usize, map_file: &Path) -> String {
    // ---
    let mut out = String::from("\x1bc");
    out.push_str("Live Traffic Trend Monitor\n\n");

    if report.is_empty() {
        out.push_str("No data available\n");
    } else {
        out.push_str(&status_table(report, limit).render());
        out.push_str("\nSuggested Actions\n");
        out.push_str(&advisory_table(report, limit).render());
    }

    let _ = writeln!(
        out,
        "\nUpdated {} UTC. Map updated → open '{}' and refresh browser",
        report.generated_at.format("%H:%M:%S"),
        map_file.display()
    );
    out
}

/// Readings are shown without a trailing `.0` when they are whole.
pub fn format_reading(value: f64) -> String {
    // ---
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Scores carry an explicit sign and one decimal.
pub fn format_score(score: f64) -> String {
    format!("{:+.1}", score)
}
