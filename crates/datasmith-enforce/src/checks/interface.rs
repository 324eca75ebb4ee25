//! Interface conformance and constructor dependency injection.

use ast_grep_core::{Doc, Node};
use datasmith_core::{Severity, Violation};

use crate::ast::{class_methods, definition_name, descendants_of_kind, violation_at};
use crate::config::EnforceConfig;

/// Every top-level `*Extractor` class must list the configured interface
/// symbol in its base clause.
pub fn check_interface<D: Doc>(
    root: &Node<D>,
    config: &EnforceConfig,
    out: &mut Vec<Violation>,
) {
    if !config.enforce_interface {
        return;
    }
    for class in extractor_classes(root, config) {
        let name = definition_name(&class).unwrap_or_default();
        let implements = class
            .field("superclasses")
            .map(|bases| {
                bases
                    .children()
                    .any(|base| base.text() == config.extractor_interface.as_str())
            })
            .unwrap_or(false);
        if !implements {
            out.push(violation_at(
                "INTERFACE_NOT_IMPLEMENTED",
                Severity::Error,
                format!(
                    "class {} must inherit from {}",
                    name, config.extractor_interface
                ),
                &class,
            ));
        }
    }
}

/// Every extractor must receive its dependencies through a constructor
/// argument whose annotation is in the injectable set.
pub fn check_injection<D: Doc>(
    root: &Node<D>,
    config: &EnforceConfig,
    out: &mut Vec<Violation>,
) {
    for class in extractor_classes(root, config) {
        let name = definition_name(&class).unwrap_or_default();
        let init = class_methods(&class)
            .into_iter()
            .find(|m| definition_name(m).as_deref() == Some("__init__"));

        let injected = init.as_ref().is_some_and(|init| {
            init.field("parameters").is_some_and(|params| {
                params.children().any(|p| {
                    p.field("type").is_some_and(|annotation| {
                        config
                            .injectable_types
                            .iter()
                            .any(|t| annotation.text() == t.as_str())
                    })
                })
            })
        });

        if !injected {
            let anchor = init.unwrap_or_else(|| class.clone());
            out.push(violation_at(
                "MISSING_INJECTION",
                Severity::Error,
                format!(
                    "{}.__init__ must take a dependency annotated with one of: {}",
                    name,
                    config.injectable_types.join(", ")
                ),
                &anchor,
            ));
        }
    }
}

/// Classes named `*Extractor`, excluding the interface symbol itself.
fn extractor_classes<'r, D: Doc>(
    root: &Node<'r, D>,
    config: &EnforceConfig,
) -> Vec<Node<'r, D>> {
    descendants_of_kind(root, "class_definition")
        .into_iter()
        .filter(|class| {
            definition_name(class)
                .map(|name| name.ends_with("Extractor") && name != config.extractor_interface)
                .unwrap_or(false)
        })
        .collect()
}
