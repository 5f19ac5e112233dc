//! Variable-to-class bindings used to resolve `$obj->method()` calls

use super::calls::constructed_type;
use super::declarations::{CLASS_KINDS, FUNCTION_SCOPES};
use super::syntax::{captures, end_line, enclosing, field_text, first, last_segment, node_text, start_line};
use super::FileContext;
use crate::model::ObjectBinding;
use tree_sitter::Node;

/// Bindings from `$x = new Foo()` and from typed parameters.
///
/// An assignment binds from its own line to the end of the enclosing function
/// (or the file). A typed parameter binds over the whole function.
pub(crate) fn extract_bindings(ctx: &FileContext, root: &Node) -> Vec<ObjectBinding> {
    let source = ctx.source;
    let mut bindings = Vec::new();

    for m in captures(&ctx.queries.bindings, *root, source) {
        if let (Some(object), Some(creation)) = (first(&m, "object"), first(&m, "creation")) {
            let Some(class_name) = constructed_type(&creation)
                .filter(|d| matches!(d.kind(), "name" | "qualified_name"))
                .and_then(|d| node_text(&d, source))
                .and_then(|name| class_for(&creation, &name, source))
            else {
                continue;
            };
            let Some(object) = node_text(&object, source) else {
                continue;
            };
            let end = enclosing(&creation, FUNCTION_SCOPES)
                .map(|scope| end_line(&scope))
                .unwrap_or(ctx.file_end);
            bindings.push(ObjectBinding {
                object,
                class_name,
                start_line: start_line(&creation),
                end_line: end,
            });
        } else if let (Some(ty), Some(object)) = (first(&m, "param_type"), first(&m, "param_object"))
        {
            let Some(scope) = enclosing(&object, FUNCTION_SCOPES) else {
                continue;
            };
            let (Some(type_name), Some(object)) = (node_text(&ty, source), node_text(&object, source))
            else {
                continue;
            };
            let Some(class_name) = class_for(&ty, &type_name, source) else {
                continue;
            };
            bindings.push(ObjectBinding {
                object,
                class_name,
                start_line: start_line(&scope),
                end_line: end_line(&scope),
            });
        }
    }

    bindings
}

/// Unqualified class name for a type written at `node`; `self` and `static`
/// refer to the enclosing class.
fn class_for(node: &Node, written: &str, source: &str) -> Option<String> {
    match written.to_ascii_lowercase().as_str() {
        "self" | "static" => enclosing(node, CLASS_KINDS).and_then(|c| field_text(&c, "name", source)),
        "parent" => None,
        _ => Some(last_segment(written).to_string()),
    }
}
