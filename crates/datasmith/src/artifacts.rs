//! Artifact writing: generated files, backups, run metadata.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use datasmith_core::{GeneratedCode, ValidationResult};
use datasmith_llm::TokenUsage;

/// Run metadata written next to the artifacts.
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub tokens: TokenUsage,
    pub duration_ms: u64,
    pub validation_summary: ValidationSummary,
}

#[derive(Debug, Serialize)]
pub struct ValidationSummary {
    pub valid: bool,
    pub errors: usize,
    pub warnings: usize,
}

impl ValidationSummary {
    pub fn from_result(result: &ValidationResult) -> Self {
        Self {
            valid: result.valid,
            errors: result.error_count(),
            warnings: result.warning_count(),
        }
    }
}

/// Write every generated file under `{project_root}/generated/`, creating a
/// timestamped backup when a file already exists. Each artifact is prefixed
/// with an auto-generated header recording the run timestamp and model.
pub fn write_artifacts(
    project_root: &Path,
    project_name: &str,
    code: &GeneratedCode,
    model: &str,
    timestamp: DateTime<Utc>,
) -> io::Result<Vec<PathBuf>> {
    let out_dir = project_root.join("generated");
    std::fs::create_dir_all(&out_dir)?;

    let mut written = Vec::with_capacity(code.files.len());
    for (rel_path, source) in &code.files {
        let file_name = sanitize(rel_path)?;
        let path = out_dir.join(&file_name);

        if path.exists() {
            let backup = out_dir.join(format!(
                "{}.{}.bak",
                file_name,
                timestamp.format("%Y%m%d%H%M%S")
            ));
            std::fs::rename(&path, &backup)?;
            tracing::info!(file = %file_name, backup = %backup.display(), "backed up artifact");
        }

        let header = format!(
            "# Generated by datasmith on {} (model: {})\n# Project: {}\n\n",
            timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
            model,
            project_name
        );
        std::fs::write(&path, format!("{header}{source}"))?;
        set_artifact_mode(&path)?;
        written.push(path);
    }
    Ok(written)
}

/// Write the run metadata JSON next to the artifacts.
pub fn write_metadata(project_root: &Path, metadata: &RunMetadata) -> io::Result<PathBuf> {
    let out_dir = project_root.join("generated");
    std::fs::create_dir_all(&out_dir)?;
    let path = out_dir.join("run_metadata.json");
    let body = serde_json::to_string_pretty(metadata)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(&path, body)?;
    set_artifact_mode(&path)?;
    Ok(path)
}

/// Artifacts land with mode 0644.
fn set_artifact_mode(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Keep artifact names flat: no separators, no traversal.
fn sanitize(rel_path: &str) -> io::Result<String> {
    let name = Path::new(rel_path)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unusable artifact path: {rel_path}"),
            )
        })?;
    if name.starts_with('.') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unusable artifact path: {rel_path}"),
        ));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn code() -> GeneratedCode {
        let mut files = IndexMap::new();
        files.insert("extractor.py".to_string(), "x = 1\n".to_string());
        files.insert("models.py".to_string(), "y = 2\n".to_string());
        GeneratedCode::new(files)
    }

    #[test]
    fn test_writes_files_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let written =
            write_artifacts(dir.path(), "demo", &code(), "test-model", Utc::now()).unwrap();
        assert_eq!(written.len(), 2);
        let body = std::fs::read_to_string(&written[0]).unwrap();
        assert!(body.starts_with("# Generated by datasmith"));
        assert!(body.contains("test-model"));
        assert!(body.ends_with("x = 1\n"));
    }

    #[test]
    fn test_existing_file_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), "demo", &code(), "m", Utc::now()).unwrap();
        write_artifacts(dir.path(), "demo", &code(), "m", Utc::now()).unwrap();
        let backups: Vec<_> = std::fs::read_dir(dir.path().join("generated"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
            .collect();
        assert_eq!(backups.len(), 2);
    }

    #[test]
    fn test_traversal_paths_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = IndexMap::new();
        files.insert("../escape.py".to_string(), "x = 1\n".to_string());
        let code = GeneratedCode::new(files);
        // the name flattens to `escape.py` inside generated/
        let written = write_artifacts(dir.path(), "demo", &code, "m", Utc::now()).unwrap();
        assert!(written[0].starts_with(dir.path().join("generated")));
    }

    #[cfg(unix)]
    #[test]
    fn test_artifact_mode_is_0644() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let written =
            write_artifacts(dir.path(), "demo", &code(), "m", Utc::now()).unwrap();
        let mode = std::fs::metadata(&written[0]).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
