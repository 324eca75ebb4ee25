//! Deterministic prompt rendering.
//!
//! Prompts are assembled from fixed-order sections rendered off the parsed
//! examples and project context; templates carry no runtime data beyond the
//! substituted sections. Identical inputs therefore produce byte-identical
//! prompts, which makes them cacheable and regression-testable.

mod sections;

use datasmith_config::ProjectSpec;
use datasmith_core::{ParsedExamples, PlanSpec};
use datasmith_enforce::EnforceConfig;

use sections::PromptSection;

/// System prompt for the planner persona.
pub const PLANNER_SYSTEM_PROMPT: &str = "\
You are a senior data-engineering architect. Given inferred schemas and \
transformation patterns extracted from concrete examples, you design the \
smallest clean extractor program that reproduces the demonstrated \
transformation. You respond with a single JSON object and nothing else.";

/// System prompt for the coder persona.
pub const CODER_SYSTEM_PROMPT: &str = "\
You are a meticulous Python engineer. You implement exactly the plan you \
are given, honoring every architectural constraint listed in the request. \
You emit complete source files only, each preceded by its `=== path ===` \
header line, with no commentary outside the files.";

/// Render the planner's user prompt: interface contract, schema summaries,
/// pattern table, canonical examples, and the output instructions, in fixed
/// order.
pub fn build_planner_prompt(parsed: &ParsedExamples, spec: &ProjectSpec) -> String {
    let sections = vec![
        sections::objective(spec),
        sections::interface_contract(),
        sections::schema_summary("Input schema", &parsed.input_schema),
        sections::schema_summary("Output schema", &parsed.output_schema),
        sections::pattern_table(parsed),
        sections::example_pairs(spec, 3),
        sections::planner_output_instructions(),
    ];
    let prompt = render(&sections);
    tracing::debug!(chars = prompt.len(), "rendered planner prompt");
    prompt
}

/// Render the coder's user prompt: the plan, the mandatory constraints
/// enumerated verbatim from the enforcer configuration, the full example
/// list, and the artifact envelope instructions.
pub fn build_coder_prompt(
    plan: &PlanSpec,
    parsed: &ParsedExamples,
    spec: &ProjectSpec,
    enforce: &EnforceConfig,
) -> String {
    let sections = vec![
        sections::objective(spec),
        sections::plan_section(plan),
        sections::constraints(enforce),
        sections::pattern_table(parsed),
        sections::example_pairs(spec, usize::MAX),
        sections::coder_output_instructions(),
    ];
    let prompt = render(&sections);
    tracing::debug!(chars = prompt.len(), "rendered coder prompt");
    prompt
}

fn render(sections: &[PromptSection]) -> String {
    let mut out = String::new();
    for section in sections {
        out.push_str("## ");
        out.push_str(&section.title);
        out.push_str("\n\n");
        out.push_str(section.body.trim_end());
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasmith_examples::parse_examples;

    fn spec() -> ProjectSpec {
        ProjectSpec::load(
            r#"
project: {name: weather}
data_sources: [{type: api, endpoint: "https://api.test/v1"}]
examples:
  - {input: {a: "1"}, output: {b: 1}}
  - {input: {a: "2"}, output: {b: 2}}
output: [{format: json}]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_planner_prompt_is_deterministic() {
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let first = build_planner_prompt(&parsed, &spec);
        let second = build_planner_prompt(&parsed, &spec);
        assert_eq!(first, second);
    }

    #[test]
    fn test_planner_prompt_has_fixed_section_order() {
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let prompt = build_planner_prompt(&parsed, &spec);
        let order = [
            "## Objective",
            "## Extractor interface",
            "## Input schema",
            "## Output schema",
            "## Transformation patterns",
            "## Examples",
            "## Output instructions",
        ];
        let mut last = 0;
        for header in order {
            let at = prompt.find(header).unwrap_or_else(|| {
                panic!("missing section {header} in:\n{prompt}")
            });
            assert!(at >= last, "section {header} out of order");
            last = at;
        }
    }

    #[test]
    fn test_pattern_table_lists_detected_patterns() {
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let prompt = build_planner_prompt(&parsed, &spec);
        assert!(prompt.contains("FIELD_RENAME"));
        assert!(prompt.contains("TYPE_CONVERSION"));
    }

    #[test]
    fn test_coder_prompt_enumerates_constraints() {
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let plan = PlanSpec {
            strategy: "rename and convert".to_string(),
            ..PlanSpec::default()
        };
        let prompt = build_coder_prompt(&plan, &parsed, &spec, &EnforceConfig::default());
        assert!(prompt.contains("BaseExtractor"));
        assert!(prompt.contains("Forbidden imports"));
        assert!(prompt.contains("=== extractor.py ==="));
        assert!(prompt.contains("rename and convert"));
    }
}
