//! The Coder persona's multi-file output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Generated source files, keyed by relative path.
///
/// One module per semantic unit: the extractor, the data models, the test
/// suite. Insertion order is preserved so artifacts are written in the order
/// the Coder emitted them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub files: IndexMap<String, String>,
    pub total_lines: usize,
    #[serde(default)]
    pub metadata: IndexMap<String, String>,
}

impl GeneratedCode {
    pub fn new(files: IndexMap<String, String>) -> Self {
        let total_lines = files.values().map(|src| src.lines().count()).sum();
        Self {
            files,
            total_lines,
            metadata: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_lines_counted() {
        let mut files = IndexMap::new();
        files.insert("extractor.py".to_string(), "a = 1\nb = 2\n".to_string());
        files.insert("models.py".to_string(), "c = 3\n".to_string());
        let code = GeneratedCode::new(files);
        assert_eq!(code.total_lines, 3);
        assert_eq!(code.file("models.py"), Some("c = 3\n"));
    }
}
