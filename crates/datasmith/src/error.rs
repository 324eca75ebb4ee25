//! Run-level error taxonomy and process exit codes.

use thiserror::Error;

use datasmith_agent::AgentError;
use datasmith_config::{ConfigError, ValidationReport};
use datasmith_core::ValidationResult;

/// Exit codes for the CLI: 0 success, 2 configuration, 3 LLM/adapter,
/// 4 validation failure after retries, 5 cancelled, 70 internal.
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_LLM: i32 = 3;
pub const EXIT_VALIDATION: i32 = 4;
pub const EXIT_CANCELLED: i32 = 5;
pub const EXIT_INTERNAL: i32 = 70;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("project spec failed validation: {count} error(s)", count = .0.errors.len())]
    SpecInvalid(ValidationReport),

    #[error("input examples carry no learnable structure (empty input schema)")]
    NothingToLearn,

    #[error("agent failure: {0}")]
    Agent(AgentError),

    #[error("generated code failed validation after {attempts} attempt(s)")]
    ValidationFailed {
        attempts: u32,
        result: ValidationResult,
    },

    #[error("run budget of {budget_secs}s exhausted during {phase}")]
    BudgetExhausted { budget_secs: u64, phase: &'static str },

    #[error("run cancelled")]
    Cancelled,

    #[error("failed to write artifacts: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AgentError> for GenerateError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Cancelled => GenerateError::Cancelled,
            other => GenerateError::Agent(other),
        }
    }
}

impl GenerateError {
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerateError::Config(_) | GenerateError::SpecInvalid(_) => EXIT_CONFIG,
            GenerateError::NothingToLearn => EXIT_CONFIG,
            GenerateError::Agent(_) | GenerateError::BudgetExhausted { .. } => EXIT_LLM,
            GenerateError::ValidationFailed { .. } => EXIT_VALIDATION,
            GenerateError::Cancelled => EXIT_CANCELLED,
            GenerateError::Io(_) => EXIT_INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(GenerateError::NothingToLearn.exit_code(), EXIT_CONFIG);
        assert_eq!(GenerateError::Cancelled.exit_code(), EXIT_CANCELLED);
        assert_eq!(
            GenerateError::ValidationFailed {
                attempts: 3,
                result: ValidationResult::from_violations(vec![], 0),
            }
            .exit_code(),
            EXIT_VALIDATION
        );
        assert_eq!(
            GenerateError::BudgetExhausted { budget_secs: 1, phase: "planning" }.exit_code(),
            EXIT_LLM
        );
    }
}
