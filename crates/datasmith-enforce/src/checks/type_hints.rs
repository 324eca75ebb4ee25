//! Type-annotation coverage.

use ast_grep_core::{Doc, Node};
use datasmith_core::{Severity, Violation};

use crate::ast::{definition_name, descendants_of_kind, violation_at};
use crate::config::EnforceConfig;

/// Every parameter (except `self`/`cls`) and every return position must
/// carry an annotation.
pub fn check_type_hints<D: Doc>(
    root: &Node<D>,
    config: &EnforceConfig,
    out: &mut Vec<Violation>,
) {
    if !config.enforce_type_hints {
        return;
    }
    for func in descendants_of_kind(root, "function_definition") {
        let func_name = definition_name(&func).unwrap_or_default();

        if let Some(params) = func.field("parameters") {
            for param in params.children() {
                match param.kind().as_ref() {
                    "identifier" => {
                        let name = param.text();
                        if name == "self" || name == "cls" {
                            continue;
                        }
                        out.push(violation_at(
                            "MISSING_TYPE_HINT",
                            Severity::Error,
                            format!("parameter '{}' of {} lacks a type hint", name, func_name),
                            &param,
                        ));
                    }
                    "default_parameter" => {
                        let name = param
                            .field("name")
                            .map(|n| n.text().to_string())
                            .unwrap_or_default();
                        out.push(violation_at(
                            "MISSING_TYPE_HINT",
                            Severity::Error,
                            format!("parameter '{}' of {} lacks a type hint", name, func_name),
                            &param,
                        ));
                    }
                    _ => {}
                }
            }
        }

        if func.field("return_type").is_none() {
            out.push(violation_at(
                "MISSING_TYPE_HINT",
                Severity::Error,
                format!("{} lacks a return type annotation", func_name),
                &func,
            ));
        }
    }
}
