//! Extracted transformation patterns.
//!
//! A [`Pattern`] is the elementary transformation unit the example parser
//! derives from the example pairs: "this output field is produced from these
//! input fields in this way", with a confidence score equal to the fraction
//! of examples the pattern's prediction reproduces.

use serde::{Deserialize, Serialize};

use crate::schema::{Schema, SchemaDiff};
use crate::value::{FieldType, Value};

/// The kind of an extracted transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    FieldMapping,
    FieldRename,
    FieldExtraction,
    ArrayFirst,
    TypeConversion,
    BooleanConversion,
    ValueMapping,
    Concatenation,
    Constant,
    NestedAccess,
    DateParsing,
    MathOperation,
    StringFormatting,
    DefaultValue,
    Custom,
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PatternKind::FieldMapping => "FIELD_MAPPING",
            PatternKind::FieldRename => "FIELD_RENAME",
            PatternKind::FieldExtraction => "FIELD_EXTRACTION",
            PatternKind::ArrayFirst => "ARRAY_FIRST",
            PatternKind::TypeConversion => "TYPE_CONVERSION",
            PatternKind::BooleanConversion => "BOOLEAN_CONVERSION",
            PatternKind::ValueMapping => "VALUE_MAPPING",
            PatternKind::Concatenation => "CONCATENATION",
            PatternKind::Constant => "CONSTANT",
            PatternKind::NestedAccess => "NESTED_ACCESS",
            PatternKind::DateParsing => "DATE_PARSING",
            PatternKind::MathOperation => "MATH_OPERATION",
            PatternKind::StringFormatting => "STRING_FORMATTING",
            PatternKind::DefaultValue => "DEFAULT_VALUE",
            PatternKind::Custom => "CUSTOM",
        };
        write!(f, "{}", s)
    }
}

/// One (input-value, output-value) witness supporting a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub input: Value,
    pub output: Value,
}

/// An elementary transformation unit with source paths, a target path, a
/// kind, and a confidence score in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    /// Primary source path, when the transformation reads a single field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// All source paths, for multi-field transformations (concatenation,
    /// arithmetic over two fields).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_paths: Vec<String>,
    pub target_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<FieldType>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
    pub transformation_note: String,
}

/// Non-fatal findings surfaced during example parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "code", content = "detail")]
pub enum ParseWarning {
    /// Fewer than three examples were supplied.
    LowExampleCount(usize),
    /// Two pattern kinds tied at equal confidence for one target field.
    ConflictingPatterns(String),
    /// No detectable source for an output field.
    UnreachableOutputField(String),
}

/// The combined output of schema inference and pattern extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedExamples {
    pub input_schema: Schema,
    pub output_schema: Schema,
    pub patterns: Vec<Pattern>,
    pub schema_differences: Vec<SchemaDiff>,
    pub num_examples: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

impl ParsedExamples {
    /// Patterns with confidence ≥ 0.9.
    pub fn high_confidence(&self) -> Vec<&Pattern> {
        self.patterns.iter().filter(|p| p.confidence >= 0.9).collect()
    }

    /// Patterns with confidence in [0.7, 0.9).
    pub fn medium_confidence(&self) -> Vec<&Pattern> {
        self.patterns
            .iter()
            .filter(|p| p.confidence >= 0.7 && p.confidence < 0.9)
            .collect()
    }

    /// Patterns with confidence < 0.7.
    pub fn low_confidence(&self) -> Vec<&Pattern> {
        self.patterns.iter().filter(|p| p.confidence < 0.7).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_kind_serde_names() {
        let json = serde_json::to_string(&PatternKind::FieldRename).unwrap();
        assert_eq!(json, "\"FIELD_RENAME\"");
        let back: PatternKind = serde_json::from_str("\"ARRAY_FIRST\"").unwrap();
        assert_eq!(back, PatternKind::ArrayFirst);
    }

    #[test]
    fn test_confidence_partitions() {
        let mk = |confidence: f64| Pattern {
            kind: PatternKind::FieldMapping,
            source_path: Some("a".into()),
            source_paths: vec![],
            target_path: "a".into(),
            source_type: None,
            target_type: None,
            confidence,
            evidence: vec![],
            transformation_note: String::new(),
        };
        let parsed = ParsedExamples {
            input_schema: Schema::default(),
            output_schema: Schema::default(),
            patterns: vec![mk(1.0), mk(0.9), mk(0.75), mk(0.3)],
            schema_differences: vec![],
            num_examples: 2,
            warnings: vec![],
        };
        assert_eq!(parsed.high_confidence().len(), 2);
        assert_eq!(parsed.medium_confidence().len(), 1);
        assert_eq!(parsed.low_confidence().len(), 1);
    }
}
