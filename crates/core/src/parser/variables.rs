//! Superglobals, globals, statics, constants and assignments

use super::declarations::{CLASS_KINDS, FUNCTION_SCOPES};
use super::syntax::{
    captures, children_by_kind, end_line, enclosing, field_text, find_child_by_kind, first,
    last_named_child, node_text, start_line,
};
use super::FileContext;
use crate::model::{VariableKind, VariableRecord, NOT_IN_METHOD};
use tree_sitter::Node;

const SUPERGLOBALS: &[&str] = &[
    "$GLOBALS", "$_SERVER", "$_GET", "$_POST", "$_FILES", "$_COOKIE", "$_SESSION", "$_REQUEST",
    "$_ENV",
];

const NAMED_SCOPES: &[&str] = &["function_definition", "method_declaration"];

pub(crate) fn extract_variables(ctx: &FileContext, root: &Node) -> Vec<VariableRecord> {
    let source = ctx.source;
    let mut variables = Vec::new();

    for m in captures(&ctx.queries.variables, *root, source) {
        if let Some(var) = first(&m, "superglobal") {
            variables.extend(superglobal(&var, source));
        } else if let Some(decl) = first(&m, "global") {
            variables.extend(
                children_by_kind(&decl, &["variable_name"])
                    .iter()
                    .filter_map(|v| record(VariableKind::Global, v, node_text(v, source)?, None, source)),
            );
        } else if let Some(decl) = first(&m, "static") {
            variables.extend(
                children_by_kind(&decl, &["static_variable_declaration"])
                    .iter()
                    .filter_map(|v| {
                        let name = field_text(v, "name", source)
                            .or_else(|| find_child_by_kind(v, "variable_name").and_then(|n| node_text(&n, source)))?;
                        let value = field_text(v, "value", source);
                        record(VariableKind::Static, v, name, value, source)
                    }),
            );
        } else if let Some(decl) = first(&m, "const") {
            // Class constants are properties of their class
            if enclosing(&decl, CLASS_KINDS).is_some() {
                continue;
            }
            variables.extend(children_by_kind(&decl, &["const_element"]).iter().filter_map(|el| {
                let name = find_child_by_kind(el, "name").and_then(|n| node_text(&n, source))?;
                let value = last_named_child(el)
                    .filter(|v| v.kind() != "name")
                    .and_then(|v| node_text(&v, source));
                record(VariableKind::Constant, el, name, value, source)
            }));
        } else if let (Some(func), Some(args)) = (first(&m, "define_fn"), first(&m, "define_args")) {
            if node_text(&func, source).is_some_and(|f| f.eq_ignore_ascii_case("define")) {
                variables.extend(define(&args, source));
            }
        } else if let (Some(target), Some(value)) = (first(&m, "assign_target"), first(&m, "assign_value")) {
            let Some(name) = node_text(&target, source) else {
                continue;
            };
            let kind = if enclosing(&target, FUNCTION_SCOPES).is_some() {
                VariableKind::Local
            } else {
                VariableKind::Program
            };
            variables.extend(record(kind, &target, name, node_text(&value, source), source));
        }
    }

    variables
}

/// `$_GET['id']`: the superglobal with its subscript as value.
fn superglobal(var: &Node, source: &str) -> Option<VariableRecord> {
    let name = node_text(var, source)?;
    if !SUPERGLOBALS.contains(&name.as_str()) {
        return None;
    }
    let subscript = var.parent()?;
    let index = last_named_child(&subscript)
        .filter(|n| n.id() != var.id())
        .and_then(|n| node_text(&n, source));
    record(VariableKind::SuperGlobal, &subscript, name, index, source)
}

/// `define('NAME', value)`
fn define(args: &Node, source: &str) -> Option<VariableRecord> {
    let values: Vec<String> = children_by_kind(args, &["argument"])
        .iter()
        .filter_map(|a| last_named_child(a).and_then(|v| node_text(&v, source)))
        .collect();
    let name = values.first()?.trim_matches(|c| c == '\'' || c == '"').to_string();
    record(VariableKind::Constant, args, name, values.get(1).cloned(), source)
}

fn record(
    kind: VariableKind,
    node: &Node,
    name: String,
    value: Option<String>,
    source: &str,
) -> Option<VariableRecord> {
    let scope = match enclosing(node, NAMED_SCOPES) {
        Some(decl) => field_text(&decl, "name", source)?,
        None => NOT_IN_METHOD.to_string(),
    };
    Some(VariableRecord {
        kind,
        name,
        value,
        start_line: start_line(node),
        end_line: end_line(node),
        scope: Some(scope),
    })
}
