//! Docstring coverage for public definitions.

use ast_grep_core::{Doc, Node};
use datasmith_core::{Severity, Violation};

use crate::ast::{definition_name, descendants_of_kind, violation_at};
use crate::config::EnforceConfig;

pub fn check_docstrings<D: Doc>(
    root: &Node<D>,
    config: &EnforceConfig,
    out: &mut Vec<Violation>,
) {
    if !config.enforce_docstrings {
        return;
    }
    for kind in ["function_definition", "class_definition"] {
        for def in descendants_of_kind(root, kind) {
            let name = definition_name(&def).unwrap_or_default();
            // private helpers and dunders are exempt
            if name.starts_with('_') {
                continue;
            }
            if !has_docstring(&def) {
                out.push(violation_at(
                    "MISSING_DOCSTRING",
                    Severity::Warning,
                    format!("{} has no docstring", name),
                    &def,
                ));
            }
        }
    }
}

/// A docstring is a leading string expression in the definition body.
fn has_docstring<D: Doc>(def: &Node<D>) -> bool {
    let Some(body) = def.field("body") else {
        return false;
    };
    let result = body
        .children()
        .find(|c| c.is_named())
        .map(|first| {
            first.kind() == "expression_statement"
                && first.children().any(|c| c.kind() == "string")
        })
        .unwrap_or(false);
    result
}
