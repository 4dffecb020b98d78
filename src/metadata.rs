//! Sensor metadata reference table.
//!
//! Loaded once at process start from a CSV keyed by sensor ID and held
//! immutable afterwards. Only the `ID`, `Lat`, `Lng`, `Fwy` and `Direction`
//! columns are read; any other column is ignored.

use std::{collections::HashMap, io::Read, path::Path};

use anyhow::{bail, Context, Result};

use crate::SensorMeta;

// ---

#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    by_id: HashMap<String, SensorMeta>,
}

impl MetadataTable {
    /// Load the table from a CSV file.
    ///
    /// A missing file, a missing required column or an unparsable row is an
    /// error; the processes cannot run without their reference data.
    pub fn load(path: &Path) -> Result<Self> {
        // ---
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open metadata file '{}'", path.display()))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("Malformed metadata file '{}'", path.display()))?;

        tracing::info!(
            "Loaded metadata for {} sensors from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse the table from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        // ---
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for required in ["ID", "Lat", "Lng"] {
            if !headers.iter().any(|h| h == required) {
                bail!("missing required column '{}'", required);
            }
        }

        let mut by_id = HashMap::new();
        for (line, record) in csv_reader.deserialize::<SensorMeta>().enumerate() {
            let meta = record.with_context(|| format!("invalid row {}", line + 2))?;
            if by_id.contains_key(&meta.id) {
                tracing::debug!("Duplicate metadata row for sensor {} ignored", meta.id);
                continue;
            }
            by_id.insert(meta.id.clone(), meta);
        }

        Ok(Self { by_id })
    }

    pub fn from_rows(rows: impl IntoIterator<Item = SensorMeta>) -> Self {
        // ---
        let mut by_id = HashMap::new();
        for meta in rows {
            by_id.entry(meta.id.clone()).or_insert(meta);
        }
        Self { by_id }
    }

    pub fn get(&self, sensor_id: &str) -> Option<&SensorMeta> {
        self.by_id.get(sensor_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
ID,Fwy,Direction,District,Lat,Lng,Name
400001,101,N,4,37.364085,-121.901149,Bascom
400017, 280 ,S,4,37.253303,-121.94544,Winchester
400001,880,S,4,0.0,0.0,Duplicate
";

    #[test]
    fn test_parse_selected_columns() {
        // ---
        let table = MetadataTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let meta = table.get("400017").unwrap();
        assert_eq!(meta.freeway, "280");
        assert_eq!(meta.direction, "S");
        assert_eq!(meta.lat, 37.253303);
        assert_eq!(meta.lng, -121.94544);
        assert!(table.get("999999").is_none());
    }

    #[test]
    fn test_first_duplicate_wins() {
        // ---
        let table = MetadataTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.get("400001").unwrap().freeway, "101");
    }

    #[test]
    fn test_missing_column_is_error() {
        // ---
        let err = MetadataTable::from_reader("ID,Lat\n1,2.0\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Lng"));
    }

    #[test]
    fn test_bad_coordinate_is_error() {
        // ---
        let csv = "ID,Lat,Lng,Fwy,Direction\n1,north,-121.0,101,N\n";
        assert!(MetadataTable::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_optional_road_columns() {
        // ---
        let csv = "ID,Lat,Lng\n7,37.0,-122.0\n";
        let table = MetadataTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.get("7").unwrap().freeway, "");
    }

    #[test]
    fn test_load_from_file() {
        // ---
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let table = MetadataTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);

        let missing = MetadataTable::load(Path::new("/definitely/not/here.csv"));
        assert!(missing.is_err());
    }
}
