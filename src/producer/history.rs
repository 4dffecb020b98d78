//! Historical readings replayed by the producer.
//!
//! The source CSV has one column per station plus an optional `Time`
//! column; every row becomes one publish round.

use std::{io::Read, path::Path};

use anyhow::{bail, Context, Result};

/// Column dropped from the replay table.
const TIME_COLUMN: &str = "Time";

// ---

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayTable {
    station_ids: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReplayTable {
    /// Load at most `max_stations` station columns from a CSV file.
    pub fn load(path: &Path, max_stations: usize) -> Result<Self> {
        // ---
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open readings file '{}'", path.display()))?;
        let table = Self::from_reader(file, max_stations)
            .with_context(|| format!("Malformed readings file '{}'", path.display()))?;

        tracing::info!(
            "Loaded {} rows for {} stations from {}",
            table.rows.len(),
            table.station_ids.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, max_stations: usize) -> Result<Self> {
        // ---
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        // (column index, station id) for the replayed columns, in file order
        let columns: Vec<(usize, String)> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .filter(|(_, name)| *name != TIME_COLUMN && !name.is_empty())
            .map(|(idx, name)| (idx, name.to_string()))
            .take(max_stations)
            .collect();

        if columns.is_empty() {
            bail!("no station columns found");
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row = columns
                .iter()
                .map(|(idx, _)| record.get(*idx).unwrap_or_default().to_string())
                .collect();
            rows.push(row);
        }

        Ok(Self {
            station_ids: columns.into_iter().map(|(_, id)| id).collect(),
            rows,
        })
    }

    pub fn station_ids(&self) -> &[String] {
        &self.station_ids
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(station id, payload)` pairs of one row; empty cells are left out.
    pub fn readings(&self, row: usize) -> impl Iterator<Item = (&str, &str)> + '_ {
        // ---
        self.rows
            .get(row)
            .into_iter()
            .flat_map(move |cells| self.station_ids.iter().zip(cells))
            .filter(|(_, value)| !value.is_empty())
            .map(|(id, value)| (id.as_str(), value.as_str()))
    }
}
