//! Enforcer configuration.

use serde::{Deserialize, Serialize};

/// The rule set the validators run against.
///
/// All fields use serde defaults so a partial configuration document works;
/// project specs override individual fields through their `validation`
/// section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforceConfig {
    /// McCabe complexity ceiling per function.
    pub max_complexity: u32,
    /// Line ceiling per method, counted over the AST node span.
    pub max_method_lines: usize,
    /// Line ceiling per class, counted over the AST node span.
    pub max_class_lines: usize,
    /// Module roots that must not be imported; dotted sub-imports of the
    /// same root are rejected too.
    pub forbidden_imports: Vec<String>,
    /// Annotation types accepted as injected constructor dependencies.
    /// Every extractor `__init__` must take at least one argument whose
    /// annotation is in this set.
    pub injectable_types: Vec<String>,
    /// Base class every `*Extractor` class must list.
    pub extractor_interface: String,
    pub enforce_type_hints: bool,
    pub enforce_docstrings: bool,
    pub enforce_interface: bool,
    pub allow_print_statements: bool,
}

impl Default for EnforceConfig {
    fn default() -> Self {
        Self {
            max_complexity: 10,
            max_method_lines: 50,
            max_class_lines: 200,
            forbidden_imports: vec![
                "os".to_string(),
                "subprocess".to_string(),
                "eval".to_string(),
                "exec".to_string(),
                "compile".to_string(),
                "__import__".to_string(),
            ],
            injectable_types: vec![
                "DataSourceClient".to_string(),
                "SourceAdapter".to_string(),
                "Logger".to_string(),
            ],
            extractor_interface: "BaseExtractor".to_string(),
            enforce_type_hints: true,
            enforce_docstrings: false,
            enforce_interface: true,
            allow_print_statements: false,
        }
    }
}

/// The fixed remediation-suggestion catalog, keyed by violation code.
pub fn suggestion_for(code: &str) -> Option<String> {
    let text = match code {
        "SYNTAX_ERROR" => "fix the syntax error before re-running validation",
        "INTERFACE_NOT_IMPLEMENTED" => {
            "declare the extractor interface in the class bases, e.g. `class FooExtractor(BaseExtractor):`"
        }
        "MISSING_INJECTION" => {
            "accept dependencies through __init__ parameters annotated with an injectable type"
        }
        "MISSING_TYPE_HINT" => "annotate every parameter and return position",
        "FORBIDDEN_IMPORT" => "remove the import; the extractor runs in a restricted environment",
        "HIGH_COMPLEXITY" => "split the function into smaller helpers",
        "METHOD_TOO_LONG" => "extract helper methods to shorten the body",
        "CLASS_TOO_LONG" => "split responsibilities across classes",
        "DANGEROUS_FUNCTION" => "replace eval/exec/compile with explicit parsing logic",
        "SQL_INJECTION_RISK" => "use parameterized queries instead of string interpolation",
        "HARDCODED_CREDENTIAL" => "read credentials from configuration, never from literals",
        "PRINT_STATEMENT" => "use the injected logger instead of print()",
        "UNLOGGED_EXCEPTION" => "log the exception before handling it",
        "MISSING_DOCSTRING" => "add a one-line docstring describing the behavior",
        _ => return None,
    };
    Some(text.to_string())
}
