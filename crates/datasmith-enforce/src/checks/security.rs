//! Security checks: dangerous calls, SQL string building, hardcoded
//! credentials.

use ast_grep_core::{Doc, Node};
use datasmith_core::{Severity, Violation};
use regex::Regex;
use std::sync::OnceLock;

use crate::ast::{violation_at, walk};
use crate::config::EnforceConfig;

const DANGEROUS_CALLS: &[&str] = &["eval", "exec", "compile", "__import__"];

fn credential_name() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(api[_-]?key|secret|token|password)").unwrap())
}

fn high_entropy_value() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // long, dense, mixed alphanumerics: the shape of a real credential
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9+/=_\-]{16,}$").unwrap())
}

pub fn check_security<D: Doc>(root: &Node<D>, _config: &EnforceConfig, out: &mut Vec<Violation>) {
    walk(root, &mut |node| match node.kind().as_ref() {
        "call" => {
            check_call(node, out);
        }
        "assignment" => {
            check_assignment(node, out);
        }
        _ => {}
    });
}

fn check_call<D: Doc>(call: &Node<D>, out: &mut Vec<Violation>) {
    let Some(function) = call.field("function") else {
        return;
    };

    // eval / exec / compile / __import__
    if function.kind() == "identifier" && DANGEROUS_CALLS.contains(&function.text().as_ref()) {
        out.push(violation_at(
            "DANGEROUS_FUNCTION",
            Severity::Error,
            format!("call to dangerous function '{}'", function.text()),
            call,
        ));
        return;
    }

    // SQL built from variables and handed to .execute(...)
    if function.kind() == "attribute" {
        let method = function
            .field("attribute")
            .map(|a| a.text().to_string())
            .unwrap_or_default();
        if method == "execute" || method == "executemany" {
            if let Some(args) = call.field("arguments") {
                if let Some(first) = args.children().find(|c| c.is_named()) {
                    if is_dynamic_sql(&first) {
                        out.push(violation_at(
                            "SQL_INJECTION_RISK",
                            Severity::Error,
                            "SQL statement built from variables at execute() call site"
                                .to_string(),
                            call,
                        ));
                    }
                }
            }
        }
    }
}

/// A string produced by concatenation, %-formatting, `.format(...)`, or an
/// f-string with interpolation.
fn is_dynamic_sql<D: Doc>(arg: &Node<D>) -> bool {
    match arg.kind().as_ref() {
        "binary_operator" => {
            let mut has_string = false;
            let mut has_variable = false;
            walk(arg, &mut |n| match n.kind().as_ref() {
                "string" => has_string = true,
                "identifier" | "call" | "attribute" => has_variable = true,
                _ => {}
            });
            has_string && has_variable
        }
        "call" => arg
            .field("function")
            .and_then(|f| f.field("attribute"))
            .map(|a| a.text() == "format")
            .unwrap_or(false),
        "string" => {
            // f-strings carry interpolation child nodes
            let mut interpolated = false;
            walk(arg, &mut |n| {
                if n.kind() == "interpolation" {
                    interpolated = true;
                }
            });
            interpolated
        }
        _ => false,
    }
}

fn check_assignment<D: Doc>(assignment: &Node<D>, out: &mut Vec<Violation>) {
    let Some(left) = assignment.field("left") else {
        return;
    };
    if left.kind() != "identifier" || !credential_name().is_match(&left.text()) {
        return;
    }
    let Some(right) = assignment.field("right") else {
        return;
    };
    if right.kind() != "string" {
        return;
    }
    let literal = right.text();
    let value = literal.trim_matches(['"', '\'']);
    let dense = high_entropy_value().is_match(value);
    let mixed = value.chars().any(|c| c.is_ascii_alphabetic())
        && value.chars().any(|c| c.is_ascii_digit());
    if dense && mixed {
        out.push(violation_at(
            "HARDCODED_CREDENTIAL",
            Severity::Error,
            format!("credential-looking literal assigned to '{}'", left.text()),
            assignment,
        ));
    }
}
