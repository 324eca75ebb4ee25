//! Transformation-pattern extraction from example pairs.
//!
//! For each output field the parser probes a fixed cascade of detectors —
//! constants, copies, renames, nested access, array indexing, casts,
//! boolean tables, value maps, concatenation, date parsing, arithmetic,
//! string formatting, defaults — and keeps the first whose confidence
//! clears 0.5. Targets nothing explains fall back to a `CUSTOM` pattern for
//! the coder to resolve; the parser itself never fails on bad data.

mod detect;
mod matching;

use datasmith_core::{ExamplePair, ParseWarning, ParsedExamples, Pattern, PatternKind};
use datasmith_schema::{compare_schemas, infer_schema};

use detect::DetectCtx;

pub use matching::{canonical, cast, values_match, MatchKind};

/// Minimum confidence for a detector to claim a target field.
const CONFIDENCE_FLOOR: f64 = 0.5;

/// Tunables for pattern extraction.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Confidence bonus applied when the rename hint (schema-analyzer
    /// rename diff or sample-value Jaccard) supports a `FIELD_RENAME`.
    /// Heuristic; exposed as a knob rather than a hard constant.
    pub rename_bonus: f64,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { rename_bonus: 0.05 }
    }
}

/// Parse example pairs into schemas, schema differences, and ranked
/// transformation patterns.
pub fn parse_examples(examples: &[ExamplePair]) -> ParsedExamples {
    parse_examples_with(examples, &ParserOptions::default())
}

/// [`parse_examples`] with explicit tunables.
pub fn parse_examples_with(examples: &[ExamplePair], opts: &ParserOptions) -> ParsedExamples {
    let inputs: Vec<_> = examples.iter().map(|ex| ex.input.clone()).collect();
    let outputs: Vec<_> = examples.iter().map(|ex| ex.output.clone()).collect();

    let input_schema = infer_schema(&inputs);
    let output_schema = infer_schema(&outputs);
    let schema_differences = compare_schemas(&input_schema, &output_schema);

    let mut warnings = Vec::new();
    if examples.len() < 3 {
        warnings.push(ParseWarning::LowExampleCount(examples.len()));
    }

    let ctx = DetectCtx::new(
        examples,
        &input_schema,
        &output_schema,
        &schema_differences,
        opts.rename_bonus,
    );

    let mut patterns = Vec::new();
    for field in &output_schema.fields {
        if field.path.contains("[*]")
            || field.field_type == datasmith_core::FieldType::Object
        {
            continue;
        }
        detect_target(&ctx, &field.path, &mut patterns, &mut warnings);
    }

    tracing::debug!(
        examples = examples.len(),
        patterns = patterns.len(),
        warnings = warnings.len(),
        "parsed examples"
    );

    ParsedExamples {
        input_schema,
        output_schema,
        patterns,
        schema_differences,
        num_examples: examples.len(),
        warnings,
    }
}

/// Run the detector cascade for one target path and record the outcome.
fn detect_target(
    ctx: &DetectCtx,
    target: &str,
    patterns: &mut Vec<Pattern>,
    warnings: &mut Vec<ParseWarning>,
) {
    let outs = ctx.outputs_at(target);

    // Priority order; all candidates are evaluated so ties can be reported.
    let candidates: Vec<Pattern> = [
        detect::detect_constant(ctx, target, &outs),
        detect::detect_field_mapping(ctx, target, &outs),
        detect::detect_field_rename(ctx, target, &outs),
        detect::detect_nested_access(ctx, target, &outs),
        detect::detect_array_first(ctx, target, &outs),
        detect::detect_type_conversion(ctx, target, &outs),
        detect::detect_boolean_conversion(ctx, target, &outs),
        detect::detect_value_mapping(ctx, target, &outs),
        detect::detect_concatenation(ctx, target, &outs),
        detect::detect_date_parsing(ctx, target, &outs),
        detect::detect_math_operation(ctx, target, &outs),
        detect::detect_string_formatting(ctx, target, &outs),
        detect::detect_default_value(ctx, target, &outs),
    ]
    .into_iter()
    .flatten()
    .collect();

    let winner = match candidates.iter().find(|p| p.confidence >= CONFIDENCE_FLOOR) {
        Some(winner) => winner.clone(),
        None => {
            warnings.push(ParseWarning::UnreachableOutputField(target.to_string()));
            patterns.push(detect::custom_fallback(ctx, target, &outs));
            return;
        }
    };

    // A type conversion alongside a coerced copy/rename is complementary,
    // not a conflict; it is emitted as a companion below.
    let complementary = |kind: PatternKind| {
        matches!(winner.kind, PatternKind::FieldMapping | PatternKind::FieldRename)
            && kind == PatternKind::TypeConversion
    };
    if candidates.iter().any(|p| {
        p.kind != winner.kind
            && !complementary(p.kind)
            && p.confidence >= CONFIDENCE_FLOOR
            && (p.confidence - winner.confidence).abs() < 1e-9
    }) {
        warnings.push(ParseWarning::ConflictingPatterns(target.to_string()));
    }

    // A copy or rename that matched across representations also implies a
    // type conversion for the coder to perform.
    let companion = match winner.kind {
        PatternKind::FieldMapping | PatternKind::FieldRename => winner
            .source_path
            .as_deref()
            .and_then(|source| {
                let differs = match (winner.source_type, winner.target_type) {
                    (Some(s), Some(t)) => s != t,
                    _ => false,
                };
                if differs {
                    detect::conversion_for_source(ctx, source, target, &outs)
                } else {
                    None
                }
            })
            .filter(|p| p.confidence >= CONFIDENCE_FLOOR),
        _ => None,
    };

    patterns.push(winner);
    if let Some(companion) = companion {
        patterns.push(companion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasmith_core::Value;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn pair(input: Value, output: Value) -> ExamplePair {
        ExamplePair::new(input, output)
    }

    fn find<'a>(parsed: &'a ParsedExamples, kind: PatternKind, target: &str) -> &'a Pattern {
        parsed
            .patterns
            .iter()
            .find(|p| p.kind == kind && p.target_path == target)
            .unwrap_or_else(|| {
                panic!(
                    "no {} pattern for {}; got {:?}",
                    kind,
                    target,
                    parsed
                        .patterns
                        .iter()
                        .map(|p| (p.kind, p.target_path.clone(), p.confidence))
                        .collect::<Vec<_>>()
                )
            })
    }

    #[test]
    fn test_rename_with_type_widening() {
        // {a:"1"} -> {b:1}, {a:"2"} -> {b:2}
        let examples = vec![
            pair(
                obj(&[("a", Value::String("1".into()))]),
                obj(&[("b", Value::Int(1))]),
            ),
            pair(
                obj(&[("a", Value::String("2".into()))]),
                obj(&[("b", Value::Int(2))]),
            ),
        ];
        let parsed = parse_examples(&examples);

        let rename = find(&parsed, PatternKind::FieldRename, "b");
        assert_eq!(rename.source_path.as_deref(), Some("a"));
        // 2/2 matched plus the rename hint bonus, capped at 1.0
        assert!((rename.confidence - 1.0).abs() < 1e-9);

        let conversion = find(&parsed, PatternKind::TypeConversion, "b");
        assert_eq!(conversion.source_path.as_deref(), Some("a"));
        assert_eq!(conversion.target_type, Some(datasmith_core::FieldType::Integer));
    }

    #[test]
    fn test_nested_extraction_with_array_first() {
        let example = || {
            pair(
                obj(&[
                    (
                        "w",
                        Value::Array(vec![
                            obj(&[("d", Value::String("rain".into()))]),
                            obj(&[("d", Value::String("wind".into()))]),
                        ]),
                    ),
                    ("m", obj(&[("t", Value::Float(15.5))])),
                ]),
                obj(&[
                    ("cond", Value::String("rain".into())),
                    ("temp", Value::Float(15.5)),
                ]),
            )
        };
        let parsed = parse_examples(&[example(), example()]);

        let first = find(&parsed, PatternKind::ArrayFirst, "cond");
        assert_eq!(first.source_path.as_deref(), Some("w[0].d"));
        assert!((first.confidence - 1.0).abs() < 1e-9);

        let nested = find(&parsed, PatternKind::NestedAccess, "temp");
        assert_eq!(nested.source_path.as_deref(), Some("m.t"));
        assert!((nested.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_boolean_normalization() {
        let examples = vec![
            pair(
                obj(&[("s", Value::String("Yes".into()))]),
                obj(&[("active", Value::Bool(true))]),
            ),
            pair(
                obj(&[("s", Value::String("No".into()))]),
                obj(&[("active", Value::Bool(false))]),
            ),
            pair(
                obj(&[("s", Value::String("yes".into()))]),
                obj(&[("active", Value::Bool(true))]),
            ),
        ];
        let parsed = parse_examples(&examples);
        let boolean = find(&parsed, PatternKind::BooleanConversion, "active");
        assert_eq!(boolean.source_path.as_deref(), Some("s"));
        assert!((boolean.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_concatenation_with_delimiter_inference() {
        let examples = vec![
            pair(
                obj(&[
                    ("f", Value::String("Alice".into())),
                    ("l", Value::String("Johnson".into())),
                ]),
                obj(&[("name", Value::String("Alice Johnson".into()))]),
            ),
            pair(
                obj(&[
                    ("f", Value::String("Bob".into())),
                    ("l", Value::String("Smith".into())),
                ]),
                obj(&[("name", Value::String("Bob Smith".into()))]),
            ),
        ];
        let parsed = parse_examples(&examples);
        let concat = find(&parsed, PatternKind::Concatenation, "name");
        assert_eq!(concat.source_paths, vec!["f".to_string(), "l".to_string()]);
        assert!((concat.confidence - 1.0).abs() < 1e-9);
        assert!(concat.transformation_note.contains("\" \""));
    }

    #[test]
    fn test_unreachable_output_field_goes_custom() {
        // Output key never appears in inputs and is not constant.
        let examples = vec![
            pair(
                obj(&[("x", Value::Int(1))]),
                obj(&[("mystery", Value::String("alpha".into()))]),
            ),
            pair(
                obj(&[("x", Value::Int(2))]),
                obj(&[("mystery", Value::String("beta".into()))]),
            ),
        ];
        let parsed = parse_examples(&examples);
        let custom = find(&parsed, PatternKind::Custom, "mystery");
        assert!(custom.confidence < 0.5);
        assert!(parsed
            .warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::UnreachableOutputField(t) if t == "mystery")));
    }

    #[test]
    fn test_constant_detected() {
        let examples = vec![
            pair(obj(&[("x", Value::Int(1))]), obj(&[("unit", Value::String("celsius".into()))])),
            pair(obj(&[("x", Value::Int(2))]), obj(&[("unit", Value::String("celsius".into()))])),
        ];
        let parsed = parse_examples(&examples);
        let constant = find(&parsed, PatternKind::Constant, "unit");
        assert!((constant.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_math_scale_detected() {
        let examples = vec![
            pair(obj(&[("cents", Value::Int(250))]), obj(&[("dollars", Value::Float(2.5))])),
            pair(obj(&[("cents", Value::Int(1000))]), obj(&[("dollars", Value::Float(10.0))])),
        ];
        let parsed = parse_examples(&examples);
        let math = find(&parsed, PatternKind::MathOperation, "dollars");
        assert_eq!(math.source_path.as_deref(), Some("cents"));
        assert!((math.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_date_parsing_detected() {
        let examples = vec![
            pair(
                obj(&[("when", Value::String("03/01/2024".into()))]),
                obj(&[("date", Value::String("2024-03-01".into()))]),
            ),
            pair(
                obj(&[("when", Value::String("04/02/2024".into()))]),
                obj(&[("date", Value::String("2024-04-02".into()))]),
            ),
        ];
        let parsed = parse_examples(&examples);
        let date = find(&parsed, PatternKind::DateParsing, "date");
        assert_eq!(date.source_path.as_deref(), Some("when"));
        assert!((date.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_string_formatting_uppercase() {
        let examples = vec![
            pair(
                obj(&[("code", Value::String("us".into()))]),
                obj(&[("country", Value::String("US".into()))]),
            ),
            pair(
                obj(&[("code", Value::String("de".into()))]),
                obj(&[("country", Value::String("DE".into()))]),
            ),
        ];
        let parsed = parse_examples(&examples);
        let fmt = find(&parsed, PatternKind::StringFormatting, "country");
        assert!(fmt.transformation_note.contains("uppercase"));
    }

    #[test]
    fn test_default_value_detected() {
        // Passthrough holds in a minority of examples, so the rename/copy
        // detectors stay under the floor and the default rule explains all.
        let examples = vec![
            pair(
                obj(&[("nick", Value::String("Ace".into()))]),
                obj(&[("handle", Value::String("Ace".into()))]),
            ),
            pair(
                obj(&[("nick", Value::Null)]),
                obj(&[("handle", Value::String("anonymous".into()))]),
            ),
            pair(
                obj(&[("nick", Value::Null)]),
                obj(&[("handle", Value::String("anonymous".into()))]),
            ),
        ];
        let parsed = parse_examples(&examples);
        let default = find(&parsed, PatternKind::DefaultValue, "handle");
        assert_eq!(default.source_path.as_deref(), Some("nick"));
        assert!((default.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_mapping_needs_corroboration() {
        let examples = vec![
            pair(
                obj(&[("s", Value::String("A".into()))]),
                obj(&[("state", Value::String("active".into()))]),
            ),
            pair(
                obj(&[("s", Value::String("I".into()))]),
                obj(&[("state", Value::String("inactive".into()))]),
            ),
            pair(
                obj(&[("s", Value::String("A".into()))]),
                obj(&[("state", Value::String("active".into()))]),
            ),
        ];
        let parsed = parse_examples(&examples);
        let mapping = find(&parsed, PatternKind::ValueMapping, "state");
        assert_eq!(mapping.source_path.as_deref(), Some("s"));
        assert!((mapping.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_low_example_count_warning() {
        let examples = vec![pair(obj(&[("a", Value::Int(1))]), obj(&[("a", Value::Int(1))]))];
        let parsed = parse_examples(&examples);
        assert!(parsed
            .warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::LowExampleCount(1))));
        // single-example patterns may still come out at confidence 1.0
        let mapping = find(&parsed, PatternKind::FieldMapping, "a");
        assert!((mapping.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_examples_yield_nothing() {
        let parsed = parse_examples(&[]);
        assert!(parsed.patterns.is_empty());
        assert!(parsed.input_schema.is_empty());
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let examples = vec![
            pair(
                obj(&[("a", Value::String("1".into())), ("b", Value::Int(2))]),
                obj(&[("c", Value::Int(1))]),
            ),
            pair(
                obj(&[("a", Value::String("5".into())), ("b", Value::Int(6))]),
                obj(&[("c", Value::Int(5))]),
            ),
        ];
        let first = parse_examples(&examples);
        let second = parse_examples(&examples);
        assert_eq!(first, second);
    }
}
