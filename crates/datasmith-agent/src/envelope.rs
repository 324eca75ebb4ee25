//! Parsing of the coder's delimited multi-file output.
//!
//! The coder emits artifacts as sections introduced by `=== path ===`
//! header lines. Anything before the first header is commentary and is
//! dropped; an output with no headers at all is a format failure that
//! triggers a repair retry.

use indexmap::IndexMap;

use datasmith_core::GeneratedCode;

use crate::AgentError;

/// Parse `=== path ===` sections into a [`GeneratedCode`] map.
pub fn parse_artifacts(text: &str) -> Result<GeneratedCode, AgentError> {
    let mut files: IndexMap<String, String> = IndexMap::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        if let Some(path) = header_path(line) {
            if let Some((path, body)) = current.take() {
                files.insert(path, finish_body(body));
            }
            current = Some((path, String::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }
    if let Some((path, body)) = current.take() {
        files.insert(path, finish_body(body));
    }

    if files.is_empty() {
        return Err(AgentError::InvalidArtifacts {
            detail: "no `=== path ===` sections found".to_string(),
        });
    }
    if files.values().all(|body| body.trim().is_empty()) {
        return Err(AgentError::InvalidArtifacts {
            detail: "all artifact sections are empty".to_string(),
        });
    }

    Ok(GeneratedCode::new(files))
}

fn header_path(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix("===")?.strip_suffix("===")?;
    let path = inner.trim();
    if path.is_empty() || path.contains("===") {
        return None;
    }
    Some(path.to_string())
}

/// Strip code fences the model sometimes wraps around a section body.
fn finish_body(body: String) -> String {
    let trimmed = body.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest
            .split_once('\n')
            .map(|(_, tail)| tail)
            .unwrap_or_default();
        if let Some(inner) = rest.strip_suffix("```") {
            return format!("{}\n", inner.trim_end());
        }
    }
    format!("{}\n", trimmed.trim_end())
}
