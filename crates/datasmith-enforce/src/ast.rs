//! Thin helpers over the ast-grep node API.
//!
//! The validators share a vocabulary: walk the tree, read node kinds and
//! fields, and anchor violations to 1-indexed source positions.

use ast_grep_core::{Doc, Node};
use datasmith_core::{Severity, Violation};

use crate::config::suggestion_for;

/// Depth-first visit of a node and all of its descendants.
pub fn walk<'r, D: Doc>(node: &Node<'r, D>, f: &mut dyn FnMut(&Node<'r, D>)) {
    f(node);
    for child in node.children() {
        walk(&child, f);
    }
}

/// Collect every descendant (including `node` itself) of the given kind.
pub fn descendants_of_kind<'r, D: Doc>(node: &Node<'r, D>, kind: &str) -> Vec<Node<'r, D>> {
    let mut found = Vec::new();
    walk(node, &mut |n| {
        if n.kind() == kind {
            found.push(n.clone());
        }
    });
    found
}

/// 1-indexed line of a node's first character.
pub fn line_of<D: Doc>(node: &Node<D>) -> usize {
    node.start_pos().byte_point().0 + 1
}

/// 1-indexed column of a node's first character.
pub fn column_of<D: Doc>(node: &Node<D>) -> usize {
    node.start_pos().byte_point().1 + 1
}

/// Number of source lines a node spans.
pub fn line_span<D: Doc>(node: &Node<D>) -> usize {
    let start = node.start_pos().byte_point().0;
    let end = node.end_pos().byte_point().0;
    end.saturating_sub(start) + 1
}

/// Build a violation anchored to a node, pulling the suggestion from the
/// fixed catalog.
pub fn violation_at<D: Doc>(
    code: &str,
    severity: Severity,
    message: String,
    node: &Node<D>,
) -> Violation {
    Violation {
        code: code.to_string(),
        severity,
        message,
        line: line_of(node),
        column: Some(column_of(node)),
        suggestion: suggestion_for(code),
    }
}

/// The name of a function or class definition node.
pub fn definition_name<D: Doc>(node: &Node<D>) -> Option<String> {
    node.field("name").map(|n| n.text().to_string())
}

/// The function definitions directly relevant to a class body (its
/// methods), looking through decorated definitions.
pub fn class_methods<'r, D: Doc>(class: &Node<'r, D>) -> Vec<Node<'r, D>> {
    let Some(body) = class.field("body") else {
        return Vec::new();
    };
    let mut methods = Vec::new();
    for child in body.children() {
        if child.kind() == "function_definition" {
            methods.push(child);
        } else if child.kind() == "decorated_definition" {
            if let Some(def) = child.field("definition") {
                if def.kind() == "function_definition" {
                    methods.push(def);
                }
            }
        }
    }
    methods
}
