//! Inferred schemas and schema differences.

use serde::{Deserialize, Serialize};

use crate::value::{FieldType, Value};

/// One typed field path observed in a set of example values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Dot path, with `[*]` for array-element descent.
    pub path: String,
    pub field_type: FieldType,
    /// True when a null was observed at this path in some example.
    pub nullable: bool,
    /// True when the path appears in every example.
    pub required: bool,
    /// Up to three observed sample values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_values: Vec<Value>,
    /// Child schema for object- and array-of-object-valued fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_schema: Option<Box<Schema>>,
}

/// Ordered set of typed field paths inferred from a set of values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<SchemaField>,
    pub is_nested: bool,
    pub has_arrays: bool,
}

impl Schema {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by its exact path.
    pub fn field(&self, path: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Paths of all leaf fields (fields that are not objects or arrays).
    pub fn leaf_paths(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !matches!(f.field_type, FieldType::Object | FieldType::Array))
            .map(|f| f.path.as_str())
            .collect()
    }
}

/// How one path differs between two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaDiffKind {
    Added,
    Removed,
    RenamedFrom,
    TypeChanged,
    StructureChanged,
}

/// One difference produced by comparing an input schema to an output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub path: String,
    pub kind: SchemaDiffKind,
    /// Human-readable detail; for `RenamedFrom` this is the source path.
    pub detail: String,
}
