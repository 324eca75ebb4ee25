//! Forbidden-import rejection.

use ast_grep_core::{Doc, Node};
use datasmith_core::{Severity, Violation};

use crate::ast::{violation_at, walk};
use crate::config::EnforceConfig;

/// Reject imports of forbidden module roots. `import os.path` and
/// `from os.path import join` both resolve to the root `os`.
pub fn check_imports<D: Doc>(root: &Node<D>, config: &EnforceConfig, out: &mut Vec<Violation>) {
    walk(root, &mut |node| match node.kind().as_ref() {
        "import_statement" => {
            for child in node.children() {
                let target = match child.kind().as_ref() {
                    "dotted_name" => Some(child.text().to_string()),
                    "aliased_import" => child.field("name").map(|n| n.text().to_string()),
                    _ => None,
                };
                if let Some(module) = target {
                    flag_if_forbidden(&module, config, node, out);
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.field("module_name") {
                flag_if_forbidden(&module.text(), config, node, out);
            }
        }
        _ => {}
    });
}

fn flag_if_forbidden<D: Doc>(
    module: &str,
    config: &EnforceConfig,
    node: &Node<D>,
    out: &mut Vec<Violation>,
) {
    let root_name = module.split('.').next().unwrap_or(module);
    if config.forbidden_imports.iter().any(|f| f == root_name) {
        out.push(violation_at(
            "FORBIDDEN_IMPORT",
            Severity::Error,
            format!("import of forbidden module '{}'", module),
            node,
        ));
    }
}
