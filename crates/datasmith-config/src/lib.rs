//! Project specification loading and validation.
//!
//! A project spec is a YAML document naming one or more data sources plus
//! concrete input/output example pairs. This crate parses it into the typed
//! [`ProjectSpec`], resolves `${NAME}` environment references inside leaf
//! strings, and rejects invalid specs before any LLM call is made.
//!
//! Loading is split in two, the way the rest of the pipeline expects it:
//! - [`ProjectSpec::load`] — syntactic: YAML → typed spec, env resolution,
//!   identifier check, source-variant check.
//! - [`validate_comprehensive`] — semantic: cross-field rules, per-variant
//!   required fields, auth exclusivity, cache TTL bounds.

mod env;
mod error;
mod spec;
mod validate;

pub use env::interpolate_env;
pub use error::ConfigError;
pub use spec::{
    AuthDescriptor, AuthType, CachePolicy, DataSourceDescriptor, OutputFormat, OutputSpec,
    ProjectMeta, ProjectSpec, RateLimitPolicy, RuntimeOpts, TableStrategy, ValidationRules,
};
pub use validate::{validate_comprehensive, ConfigIssue, ValidationReport};
