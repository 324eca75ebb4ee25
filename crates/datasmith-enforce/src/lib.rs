//! Static constraint enforcement over generated Python artifacts.
//!
//! This is the quality gate between the coder persona and the filesystem:
//! every emitted source file is parsed once and run through a cascade of
//! validators — syntax, interface conformance, constructor injection, type
//! hints, forbidden imports, complexity and size ceilings, security, and
//! logging discipline. All validators run even when earlier ones find
//! problems, so one pass reports everything; only a syntax failure
//! short-circuits, since nothing downstream can anchor to a broken tree.
//!
//! Validation is pure and CPU-bound: one parse, one AST walk per validator.

mod ast;
mod checks;
mod config;

use std::path::Path;
use std::time::Instant;

use ast_grep_core::{Doc, Node};
use ast_grep_language::{LanguageExt, SupportLang};
use thiserror::Error;

use datasmith_core::{Severity, ValidationResult, Violation};

pub use config::{suggestion_for, EnforceConfig};

/// Errors from file-level validation. Source-level problems are reported
/// as violations, never as errors.
#[derive(Debug, Error)]
pub enum EnforceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Validate one Python source text against the rule set.
pub fn validate_code(source: &str, config: &EnforceConfig) -> ValidationResult {
    let started = Instant::now();
    let grep = SupportLang::Python.ast_grep(source);
    let root = grep.root();

    let syntax = syntax_violations(&root);
    if !syntax.is_empty() {
        return ValidationResult::from_violations(syntax, elapsed_ms(started));
    }

    let mut violations = Vec::new();
    checks::interface::check_interface(&root, config, &mut violations);
    checks::interface::check_injection(&root, config, &mut violations);
    checks::type_hints::check_type_hints(&root, config, &mut violations);
    checks::imports::check_imports(&root, config, &mut violations);
    checks::complexity::check_complexity(&root, config, &mut violations);
    checks::security::check_security(&root, config, &mut violations);
    checks::logging::check_logging(&root, config, &mut violations);
    checks::docstrings::check_docstrings(&root, config, &mut violations);

    let result = ValidationResult::from_violations(violations, elapsed_ms(started));
    tracing::debug!(
        valid = result.valid,
        errors = result.error_count(),
        warnings = result.warning_count(),
        duration_ms = result.duration_ms,
        "validated source"
    );
    result
}

/// Validate a Python source file on disk.
pub fn validate_file(path: &Path, config: &EnforceConfig) -> Result<ValidationResult, EnforceError> {
    let source = std::fs::read_to_string(path).map_err(|source| EnforceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(validate_code(&source, config))
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Parse-level failures, anchored to the first broken node.
fn syntax_violations<D: Doc>(root: &Node<D>) -> Vec<Violation> {
    let mut found = Vec::new();
    ast::walk(root, &mut |node| {
        if node.kind() == "ERROR" && found.is_empty() {
            found.push(ast::violation_at(
                "SYNTAX_ERROR",
                Severity::Error,
                "invalid syntax".to_string(),
                node,
            ));
        }
    });
    found
}
