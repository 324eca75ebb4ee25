//! The Planner persona's structured blueprint.
//!
//! The Planner LLM emits a `PlanSpec` as JSON; the Coder persona consumes it
//! verbatim. Parsing is plain serde — a plan that fails to deserialize is
//! fed back to the Planner for one repair attempt.

use serde::{Deserialize, Serialize};

/// A method or field listed in a planned class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// One planned module and the classes it holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub classes: Vec<String>,
}

/// The Planner's structured output: the blueprint of modules, classes, and
/// methods the Coder is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanSpec {
    /// Prose description of the overall extraction strategy.
    pub strategy: String,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub error_handling_notes: String,
    #[serde(default)]
    pub test_outline: String,
}

impl PlanSpec {
    /// Sections a usable plan cannot be missing. Returns the names of the
    /// absent ones; empty means the plan is structurally complete.
    pub fn missing_sections(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.strategy.trim().is_empty() {
            missing.push("strategy");
        }
        if self.modules.is_empty() {
            missing.push("modules");
        }
        if self.classes.is_empty() {
            missing.push("classes");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_deserializes_with_defaults() {
        let plan: PlanSpec = serde_json::from_str(
            r#"{"strategy": "map fields", "modules": [{"name": "extractor"}],
                "classes": [{"name": "WeatherExtractor"}]}"#,
        )
        .unwrap();
        assert!(plan.missing_sections().is_empty());
        assert_eq!(plan.classes[0].name, "WeatherExtractor");
    }

    #[test]
    fn test_missing_sections_reported() {
        let plan: PlanSpec = serde_json::from_str(r#"{"strategy": ""}"#).unwrap();
        assert_eq!(plan.missing_sections(), vec!["strategy", "modules", "classes"]);
    }
}
