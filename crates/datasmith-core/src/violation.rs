//! Constraint-violation reporting types.

use serde::{Deserialize, Serialize};

/// Severity of a constraint violation. Any `Error` renders the containing
/// validation result invalid; warnings and infos are reported only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One problem found by the constraint enforcer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable machine code, e.g. `DANGEROUS_FUNCTION`.
    pub code: String,
    pub severity: Severity,
    pub message: String,
    /// 1-indexed source line.
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// The outcome of validating one source artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
    pub duration_ms: u64,
}

impl ValidationResult {
    /// Build a result from violations; `valid` is derived from the absence
    /// of error-severity entries. Violations are kept in source-line order.
    pub fn from_violations(mut violations: Vec<Violation>, duration_ms: u64) -> Self {
        violations.sort_by_key(|v| (v.line, v.column.unwrap_or(0)));
        let valid = !violations.iter().any(|v| v.severity == Severity::Error);
        Self {
            valid,
            violations,
            duration_ms,
        }
    }

    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count()
    }
}
