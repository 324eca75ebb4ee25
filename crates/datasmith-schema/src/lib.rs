//! Structural schema inference and comparison.
//!
//! [`infer_schema`] derives a typed-field-path [`Schema`] from a homogeneous
//! list of example values; [`compare_schemas`] aligns two schemas and
//! reports added/removed/renamed/retyped paths. Both are pure and
//! synchronous — no suspension points anywhere in this crate.

mod compare;
mod infer;

pub use compare::{compare_schemas, sample_jaccard};
pub use infer::infer_schema;

pub use datasmith_core::{Schema, SchemaDiff, SchemaDiffKind, SchemaField};
