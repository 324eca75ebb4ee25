//! McCabe complexity and size ceilings.

use ast_grep_core::{Doc, Node};
use datasmith_core::{Severity, Violation};

use crate::ast::{definition_name, descendants_of_kind, line_span, violation_at, walk};
use crate::config::EnforceConfig;

/// Node kinds that add one decision point each: `if`/`elif`, loops,
/// `and`/`or`, `except`, `case`, and the conditional expression.
const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "boolean_operator",
    "conditional_expression",
    "except_clause",
    "case_clause",
];

/// Cyclomatic complexity of a function body: 1 plus one per decision point.
pub fn cyclomatic_complexity<D: Doc>(func: &Node<D>) -> u32 {
    let mut count = 1u32;
    walk(func, &mut |node| {
        if DECISION_KINDS.contains(&node.kind().as_ref()) {
            count += 1;
        }
    });
    count
}

pub fn check_complexity<D: Doc>(
    root: &Node<D>,
    config: &EnforceConfig,
    out: &mut Vec<Violation>,
) {
    for func in descendants_of_kind(root, "function_definition") {
        let name = definition_name(&func).unwrap_or_default();

        let complexity = cyclomatic_complexity(&func);
        if complexity > config.max_complexity {
            out.push(violation_at(
                "HIGH_COMPLEXITY",
                Severity::Error,
                format!(
                    "{} has cyclomatic complexity {} (max {})",
                    name, complexity, config.max_complexity
                ),
                &func,
            ));
        }

        let lines = line_span(&func);
        if lines > config.max_method_lines {
            out.push(violation_at(
                "METHOD_TOO_LONG",
                Severity::Error,
                format!(
                    "{} spans {} lines (max {})",
                    name, lines, config.max_method_lines
                ),
                &func,
            ));
        }
    }

    for class in descendants_of_kind(root, "class_definition") {
        let name = definition_name(&class).unwrap_or_default();
        let lines = line_span(&class);
        if lines > config.max_class_lines {
            out.push(violation_at(
                "CLASS_TOO_LONG",
                Severity::Error,
                format!(
                    "class {} spans {} lines (max {})",
                    name, lines, config.max_class_lines
                ),
                &class,
            ));
        }
    }
}
