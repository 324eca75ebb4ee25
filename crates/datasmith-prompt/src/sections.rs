//! The individual prompt sections, rendered from fixed templates.

use datasmith_config::ProjectSpec;
use datasmith_core::{ParsedExamples, PlanSpec, Schema};
use datasmith_enforce::EnforceConfig;

/// One section of a composed prompt.
pub struct PromptSection {
    pub title: String,
    pub body: String,
}

fn section(title: &str, body: String) -> PromptSection {
    PromptSection {
        title: title.to_string(),
        body,
    }
}

pub fn objective(spec: &ProjectSpec) -> PromptSection {
    section(
        "Objective",
        format!(
            "Project `{}` transforms records from {} data source(s) into the \
             shape demonstrated by {} example pair(s). Design applies to one \
             record at a time; batching is handled by the caller.",
            spec.project.name,
            spec.data_sources.len(),
            spec.examples.len()
        ),
    )
}

pub fn interface_contract() -> PromptSection {
    section(
        "Extractor interface",
        "Every extractor must conform to this protocol:\n\n\
         ```python\n\
         class BaseExtractor:\n\
         \u{20}   def extract(self, record: Dict[str, Any]) -> Dict[str, Any]: ...\n\
         \u{20}   def extract_all(self, records: Iterable[Dict[str, Any]]) -> List[Dict[str, Any]]: ...\n\
         ```\n\n\
         Dependencies (data-source client, logger) arrive through `__init__` \
         parameters; the extractor never constructs them."
            .to_string(),
    )
}

pub fn schema_summary(title: &str, schema: &Schema) -> PromptSection {
    let mut body = String::from("| path | type | required | nullable |\n|---|---|---|---|\n");
    for field in &schema.fields {
        body.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            field.path, field.field_type, field.required, field.nullable
        ));
    }
    if schema.fields.is_empty() {
        body.push_str("| (empty) | - | - | - |\n");
    }
    section(title, body)
}

pub fn pattern_table(parsed: &ParsedExamples) -> PromptSection {
    let mut body = String::from(
        "| kind | source | target | confidence | evidence |\n|---|---|---|---|---|\n",
    );
    for p in &parsed.patterns {
        let source = p
            .source_path
            .clone()
            .unwrap_or_else(|| p.source_paths.join(" + "));
        let evidence = p
            .evidence
            .first()
            .map(|e| format!("{} -> {}", e.input, e.output))
            .unwrap_or_default();
        body.push_str(&format!(
            "| {} | {} | {} | {:.2} | {} |\n",
            p.kind, source, p.target_path, p.confidence, evidence
        ));
    }
    for warning in &parsed.warnings {
        body.push_str(&format!("\nwarning: {:?}", warning));
    }
    section("Transformation patterns", body)
}

pub fn example_pairs(spec: &ProjectSpec, limit: usize) -> PromptSection {
    let mut body = String::new();
    for (i, ex) in spec.examples.iter().take(limit).enumerate() {
        body.push_str(&format!(
            "Example {}:\ninput: {}\noutput: {}\n\n",
            i + 1,
            serde_json::to_string(&ex.input.to_json()).unwrap_or_default(),
            serde_json::to_string(&ex.output.to_json()).unwrap_or_default(),
        ));
    }
    section("Examples", body)
}

pub fn plan_section(plan: &PlanSpec) -> PromptSection {
    section(
        "Plan",
        serde_json::to_string_pretty(plan).unwrap_or_default(),
    )
}

/// The architectural constraints, enumerated verbatim so the coder sees the
/// exact rules the validator will apply.
pub fn constraints(config: &EnforceConfig) -> PromptSection {
    section(
        "Mandatory constraints",
        format!(
            "1. Every extractor class name ends with `Extractor` and inherits `{interface}`.\n\
             2. `__init__` receives dependencies via parameters annotated with one of: {injectables}.\n\
             3. Every parameter and return position carries a type annotation.\n\
             4. Forbidden imports (including dotted sub-imports): {forbidden}.\n\
             5. Cyclomatic complexity at most {complexity} per function; at most \
             {method_lines} lines per method and {class_lines} lines per class.\n\
             6. Never call eval/exec/compile; never build SQL from string \
             concatenation; never hardcode credentials.\n\
             7. No print() calls; log through the injected logger, and log every \
             handled exception.",
            interface = config.extractor_interface,
            injectables = config.injectable_types.join(", "),
            forbidden = config.forbidden_imports.join(", "),
            complexity = config.max_complexity,
            method_lines = config.max_method_lines,
            class_lines = config.max_class_lines,
        ),
    )
}

pub fn planner_output_instructions() -> PromptSection {
    section(
        "Output instructions",
        "Respond with a single JSON object, no prose, of this shape:\n\n\
         ```json\n\
         {\n\
         \u{20} \"strategy\": \"one-paragraph approach\",\n\
         \u{20} \"modules\": [{\"name\": \"extractor\", \"purpose\": \"...\", \"classes\": [\"FooExtractor\"]}],\n\
         \u{20} \"classes\": [{\"name\": \"FooExtractor\", \"bases\": [\"BaseExtractor\"], \"methods\": [\"extract\"], \"fields\": []}],\n\
         \u{20} \"imports\": [\"typing\"],\n\
         \u{20} \"error_handling_notes\": \"...\",\n\
         \u{20} \"test_outline\": \"...\"\n\
         }\n\
         ```"
            .to_string(),
    )
}

pub fn coder_output_instructions() -> PromptSection {
    section(
        "Output instructions",
        "Emit exactly three artifacts, each introduced by its header line:\n\n\
         === extractor.py ===\n\
         (the extractor class)\n\n\
         === models.py ===\n\
         (typed record models)\n\n\
         === test_extractor.py ===\n\
         (tests reproducing every example pair)\n\n\
         No text outside the three files."
            .to_string(),
    )
}
