//! Logging discipline: no print(), no silent exception handlers.

use ast_grep_core::{Doc, Node};
use datasmith_core::{Severity, Violation};

use crate::ast::{violation_at, walk};
use crate::config::EnforceConfig;

pub fn check_logging<D: Doc>(root: &Node<D>, config: &EnforceConfig, out: &mut Vec<Violation>) {
    walk(root, &mut |node| match node.kind().as_ref() {
        "call" => {
            if config.allow_print_statements {
                return;
            }
            if let Some(function) = node.field("function") {
                if function.kind() == "identifier" && function.text() == "print" {
                    out.push(violation_at(
                        "PRINT_STATEMENT",
                        Severity::Error,
                        "print() call in generated code".to_string(),
                        node,
                    ));
                }
            }
        }
        "except_clause" => {
            if !handler_logs(node) {
                out.push(violation_at(
                    "UNLOGGED_EXCEPTION",
                    Severity::Warning,
                    "exception handler without a logging call".to_string(),
                    node,
                ));
            }
        }
        _ => {}
    });
}

/// Whether the handler body contains a call routed through a logger.
fn handler_logs<D: Doc>(handler: &Node<D>) -> bool {
    let mut logs = false;
    walk(handler, &mut |node| {
        if node.kind() != "call" {
            return;
        }
        if let Some(function) = node.field("function") {
            let text = function.text();
            if text.contains("logger.") || text.contains("logging.") || text.starts_with("log.") {
                logs = true;
            }
        }
    });
    logs
}
