//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading a project specification. These surface
/// immediately; nothing config-related is retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown source type '{kind}' at {path}")]
    UnknownSourceType { kind: String, path: String },

    #[error("missing required field '{which}' at {path}")]
    MissingField { path: String, which: String },

    #[error("invalid project name '{0}': must match [a-z0-9_-]+")]
    InvalidName(String),

    #[error("undefined environment variable '${{{0}}}'")]
    UnresolvedEnvVar(String),
}
