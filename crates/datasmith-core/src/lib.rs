//! Core data model for datasmith.
//!
//! This crate holds the types every pipeline stage exchanges: the universal
//! [`Value`] sum, inferred [`Schema`]s, extracted transformation
//! [`Pattern`]s, the Planner's [`PlanSpec`], the Coder's [`GeneratedCode`],
//! and the validator's [`ValidationResult`].
//!
//! # Architecture
//!
//! This is the foundation crate in the datasmith workspace:
//! - Depends on: serde, chrono, rust_decimal, indexmap only
//! - Used by: every other datasmith crate
//!
//! Keeping the data model here (instead of in the crates that produce each
//! piece) avoids circular dependencies between the schema analyzer, example
//! parser, prompt builder, and orchestrator.

pub mod artifact;
pub mod cancel;
pub mod example;
pub mod pattern;
pub mod plan;
pub mod schema;
pub mod value;
pub mod violation;

pub use artifact::GeneratedCode;
pub use cancel::CancellationToken;
pub use example::ExamplePair;
pub use pattern::{Evidence, ParseWarning, ParsedExamples, Pattern, PatternKind};
pub use plan::{ClassSpec, ModuleSpec, PlanSpec};
pub use schema::{Schema, SchemaDiff, SchemaDiffKind, SchemaField};
pub use value::{join_path, parse_path, FieldType, PathSeg, Value};
pub use violation::{Severity, ValidationResult, Violation};
