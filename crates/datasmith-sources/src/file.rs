//! Tabular-file adapter (CSV; glob patterns allowed).

use async_trait::async_trait;
use indexmap::IndexMap;

use datasmith_core::Value;

use crate::{cache_key_for, AdapterError, FetchParams, SourceAdapter};

/// Reads delimited files into an array of records, honoring the
/// header-row and skip-rows parse hints.
pub struct TabularFileAdapter {
    file_path: String,
    header_row: Option<usize>,
    skip_rows: Option<usize>,
}

impl TabularFileAdapter {
    pub fn new(file_path: String, header_row: Option<usize>, skip_rows: Option<usize>) -> Self {
        Self {
            file_path,
            header_row,
            skip_rows,
        }
    }

    fn matching_paths(&self) -> Result<Vec<std::path::PathBuf>, AdapterError> {
        let paths: Vec<_> = glob::glob(&self.file_path)
            .map_err(|e| AdapterError::InvalidConfig(e.to_string()))?
            .filter_map(Result::ok)
            .collect();
        if paths.is_empty() {
            return Err(AdapterError::File {
                path: self.file_path.clone(),
                detail: "no files match".to_string(),
            });
        }
        Ok(paths)
    }

    fn read_file(&self, path: &std::path::Path) -> Result<Vec<Value>, AdapterError> {
        let text = std::fs::read_to_string(path).map_err(|e| AdapterError::File {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;

        // The header row may sit below preamble lines; everything before it
        // is dropped, then `skip_rows` data rows after it.
        let header_at = self.header_row.unwrap_or(0);
        let body: String = text
            .lines()
            .skip(header_at)
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AdapterError::Parse(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            if i < self.skip_rows.unwrap_or(0) {
                continue;
            }
            let row = row.map_err(|e| AdapterError::Parse(e.to_string()))?;
            let mut object = IndexMap::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                object.insert(header.clone(), parse_cell(cell));
            }
            records.push(Value::Object(object));
        }
        Ok(records)
    }
}

/// Numeric-looking cells become numbers; empty cells become null.
fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        return Value::Float(f);
    }
    Value::String(cell.to_string())
}

#[async_trait]
impl SourceAdapter for TabularFileAdapter {
    async fn fetch(&self, _params: &FetchParams) -> Result<Value, AdapterError> {
        let mut records = Vec::new();
        for path in self.matching_paths()? {
            records.extend(self.read_file(&path)?);
        }
        tracing::debug!(
            pattern = %self.file_path,
            records = records.len(),
            "read tabular source"
        );
        Ok(Value::Array(records))
    }

    fn validate_config(&self) -> bool {
        !self.file_path.is_empty()
    }

    fn cache_key(&self, params: &FetchParams) -> String {
        cache_key_for(&format!("file_tabular:{}", self.file_path), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_typed_records() {
        let file = write_csv("city,temp,note\nOslo,15.5,ok\nLima,21,\n");
        let adapter =
            TabularFileAdapter::new(file.path().display().to_string(), None, None);
        let value = adapter.fetch(&FetchParams::new()).await.unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].value_at("city"),
            Some(&Value::String("Oslo".into()))
        );
        assert_eq!(rows[0].value_at("temp"), Some(&Value::Float(15.5)));
        assert_eq!(rows[1].value_at("temp"), Some(&Value::Int(21)));
        assert_eq!(rows[1].value_at("note"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_header_row_and_skip_rows() {
        let file = write_csv("generated by tool\ncity,temp\nskipme,0\nOslo,15\n");
        let adapter =
            TabularFileAdapter::new(file.path().display().to_string(), Some(1), Some(1));
        let value = adapter.fetch(&FetchParams::new()).await.unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value_at("city"), Some(&Value::String("Oslo".into())));
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let adapter = TabularFileAdapter::new("/nonexistent/*.csv".to_string(), None, None);
        let err = adapter.fetch(&FetchParams::new()).await.unwrap_err();
        assert!(matches!(err, AdapterError::File { .. }));
    }
}
