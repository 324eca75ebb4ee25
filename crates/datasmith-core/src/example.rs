//! Input/output example pairs.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One concrete input record with its desired output record.
///
/// All examples in a project must conform to the same input schema modulo
/// optional fields; likewise for outputs. The schema analyzer verifies this
/// structurally rather than trusting the declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamplePair {
    pub input: Value,
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExamplePair {
    pub fn new(input: Value, output: Value) -> Self {
        Self {
            input,
            output,
            description: None,
        }
    }
}
