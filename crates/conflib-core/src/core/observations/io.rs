use super::key::ObservationKey;
use super::set::ObservationSet;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationIoError {
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid number '{value}' in column `{key}` at row {row}")]
    InvalidNumber {
        key: ObservationKey,
        row: usize,
        value: String,
    },
    #[error("Row {row} has {found} fields but the header declares {expected}")]
    FieldCount {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Header lists column `{0}` more than once")]
    DuplicateKey(ObservationKey),
    #[error("Cannot write observations with columns of unequal length")]
    Ragged,
}

const STREAM: &str = "<stream>";

impl ObservationSet {
    /// Reads an observation set from CSV: the header row holds the keys in their textual form
    /// (`values`, `(1, 2)`, ...), every further row holds one sample.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, ObservationIoError> {
        Self::read_csv_named(reader, STREAM)
    }

    pub fn read_csv_path(path: &Path) -> Result<Self, ObservationIoError> {
        let file = std::fs::File::open(path).map_err(|e| ObservationIoError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e.into(),
        })?;
        Self::read_csv_named(file, &path.to_string_lossy())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ObservationIoError> {
        self.write_csv_named(writer, STREAM)
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<(), ObservationIoError> {
        let file = std::fs::File::create(path).map_err(|e| ObservationIoError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e.into(),
        })?;
        self.write_csv_named(file, &path.to_string_lossy())
    }

    fn read_csv_named<R: Read>(reader: R, name: &str) -> Result<Self, ObservationIoError> {
        let csv_error = |source: csv::Error| ObservationIoError::Csv {
            path: name.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let keys: Vec<ObservationKey> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(ObservationKey::from)
            .collect();
        let mut seen = HashSet::with_capacity(keys.len());
        if let Some(key) = keys.iter().find(|key| !seen.insert(*key)) {
            return Err(ObservationIoError::DuplicateKey(key.clone()));
        }

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); keys.len()];
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_error)?;
            if record.len() != keys.len() {
                return Err(ObservationIoError::FieldCount {
                    row,
                    expected: keys.len(),
                    found: record.len(),
                });
            }
            for ((key, column), field) in keys.iter().zip(columns.iter_mut()).zip(record.iter()) {
                let value = field
                    .parse::<f64>()
                    .map_err(|_| ObservationIoError::InvalidNumber {
                        key: key.clone(),
                        row,
                        value: field.to_string(),
                    })?;
                column.push(value);
            }
        }

        Ok(keys.into_iter().zip(columns).collect())
    }

    fn write_csv_named<W: Write>(&self, writer: W, name: &str) -> Result<(), ObservationIoError> {
        let csv_error = |source: csv::Error| ObservationIoError::Csv {
            path: name.to_string(),
            source,
        };
        let rows = self.sample_count().ok_or(ObservationIoError::Ragged)?;

        let mut writer = csv::Writer::from_writer(writer);
        writer
            .write_record(self.keys().map(|key| key.to_string()))
            .map_err(csv_error)?;
        for row in 0..rows {
            writer
                .write_record(self.iter().map(|(_, values)| values[row].to_string()))
                .map_err(csv_error)?;
        }
        writer
            .flush()
            .map_err(|e| csv_error(csv::Error::from(e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn read_csv_parses_header_keys_and_columns() {
        let text = "\"(1, 2)\",\"(2, 3, 4)\",values\n0.1,1.5,-3.0\n0.2,1.6,-4.0\n";
        let set = ObservationSet::read_csv(text.as_bytes()).unwrap();

        let keys: Vec<_> = set.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                ObservationKey::coordinate([1, 2]),
                ObservationKey::coordinate([2, 3, 4]),
                ObservationKey::Values,
            ]
        );
        assert_eq!(
            set.get(&ObservationKey::coordinate([2, 3, 4])),
            Some(&[1.5, 1.6][..])
        );
        assert_eq!(set.scores(), Some(&[-3.0, -4.0][..]));
    }

    #[test]
    fn read_csv_rejects_non_numeric_fields() {
        let text = "\"(0, 1)\",values\n0.1,abc\n";
        let result = ObservationSet::read_csv(text.as_bytes());
        assert!(matches!(
            result,
            Err(ObservationIoError::InvalidNumber { row: 0, .. })
        ));
    }

    #[test]
    fn read_csv_rejects_repeated_header_keys() {
        let text = "\"(1, 2)\",\"(1,2)\",values\n0.1,0.2,1.0\n";
        let result = ObservationSet::read_csv(text.as_bytes());
        assert!(matches!(
            result,
            Err(ObservationIoError::DuplicateKey(key)) if key == ObservationKey::coordinate([1, 2])
        ));
    }

    #[test]
    fn read_csv_rejects_short_rows() {
        let text = "\"(0, 1)\",values\n0.1\n";
        let result = ObservationSet::read_csv(text.as_bytes());
        assert!(matches!(
            result,
            Err(ObservationIoError::FieldCount {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn write_then_read_through_file_preserves_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("observations.csv");
        let set = ObservationSet::new()
            .with([0, 1], vec![1.25, 2.5])
            .with(ObservationKey::Values, vec![-0.5, 0.75]);

        set.write_csv_path(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("\"(0, 1)\",values"));

        let reread = ObservationSet::read_csv_path(&path).unwrap();
        assert_eq!(reread, set);
    }

    #[test]
    fn write_csv_fails_for_ragged_sets() {
        let set = ObservationSet::new()
            .with([0], vec![1.0])
            .with([1], vec![1.0, 2.0]);
        let mut buffer = Vec::new();
        assert!(matches!(
            set.write_csv(&mut buffer),
            Err(ObservationIoError::Ragged)
        ));
    }

    #[test]
    fn read_csv_path_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = ObservationSet::read_csv_path(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(ObservationIoError::Csv { .. })));
    }
}
