//! CSV source for raw demand observations
//!
//! Reads a headered file with one timestamp column and one demand column.
//! Timestamps stay as text so the normalizer reports unparsable ones; empty
//! demand cells become NaN missing markers.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::domain::RawObservation;

pub const DEFAULT_TIME_COLUMN: &str = "Datetime";
pub const DEFAULT_VALUE_COLUMN: &str = "PJME_MW";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{0}' not found in header")]
    MissingColumn(String),

    #[error("line {line}: cannot parse demand value '{value}'")]
    UnparsableValue { line: usize, value: String },
}

#[derive(Debug, Clone)]
pub struct CsvSeriesLoader {
    time_column: String,
    value_column: String,
}

impl Default for CsvSeriesLoader {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_COLUMN, DEFAULT_VALUE_COLUMN)
    }
}

impl CsvSeriesLoader {
    pub fn new(time_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            time_column: time_column.into(),
            value_column: value_column.into(),
        }
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Vec<RawObservation>, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let observations = self.load_reader(file)?;
        debug!(path = %path.display(), rows = observations.len(), "loaded demand csv");
        Ok(observations)
    }

    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Vec<RawObservation>, LoadError> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();
        let time_idx = column_index(&headers, &self.time_column)?;
        let value_idx = column_index(&headers, &self.value_column)?;

        let mut observations = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            // 1-based, after the header line
            let line = idx + 2;
            let record = record?;
            let timestamp = record.get(time_idx).unwrap_or_default();
            let raw_value = record.get(value_idx).unwrap_or_default();
            let value = if raw_value.is_empty() {
                f64::NAN
            } else {
                raw_value.parse().map_err(|_| LoadError::UnparsableValue {
                    line,
                    value: raw_value.to_string(),
                })?
            };
            observations.push(RawObservation::new(timestamp, value));
        }
        Ok(observations)
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawTimestamp;
    use std::io::Write;

    const SAMPLE: &str = "\
Datetime,PJME_MW
2017-12-01 00:00:00,30000.0
2017-12-01 01:00:00,
2017-12-01 02:00:00, 29000.5
";

    #[test]
    fn test_load_default_columns() {
        let observations = CsvSeriesLoader::default()
            .load_reader(SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(observations.len(), 3);
        assert_eq!(
            observations[0].timestamp,
            RawTimestamp::Text("2017-12-01 00:00:00".to_string())
        );
        assert_eq!(observations[0].value, 30000.0);
        assert!(observations[1].value.is_nan());
        assert_eq!(observations[2].value, 29000.5);
    }

    #[test]
    fn test_custom_columns_in_any_order() {
        let data = "load,extra,ts\n12.5,x,2017-01-01 00:00\n";
        let observations = CsvSeriesLoader::new("ts", "load")
            .load_reader(data.as_bytes())
            .unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value, 12.5);
        assert_eq!(
            observations[0].timestamp,
            RawTimestamp::Text("2017-01-01 00:00".to_string())
        );
    }

    #[test]
    fn test_missing_column() {
        let err = CsvSeriesLoader::default()
            .load_reader("Datetime,AEP_MW\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "PJME_MW"));
    }

    #[test]
    fn test_unparsable_value_reports_line() {
        let data = "Datetime,PJME_MW\n2017-12-01 00:00:00,1\n2017-12-01 01:00:00,lots\n";
        let err = CsvSeriesLoader::default()
            .load_reader(data.as_bytes())
            .unwrap_err();
        match err {
            LoadError::UnparsableValue { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let observations = CsvSeriesLoader::default().load_path(file.path()).unwrap();
        assert_eq!(observations.len(), 3);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            CsvSeriesLoader::default().load_path(&missing),
            Err(LoadError::Io { .. })
        ));
    }
}
