//! Call-site extraction and method-type guessing

use super::declarations::{ClassContext, CLASS_KINDS};
use super::syntax::{
    captures, enclosing, field_text, find_child_by_kind, first, last_named_child, last_segment,
    literal_shape, node_text, start_line,
};
use super::FileContext;
use crate::builtins::{is_builtin_function, is_magic_method, CONSTRUCTOR};
use crate::model::{CallSite, MethodRecord, MethodType, Modifier, Parameter, Visibility, NOT_IN_METHOD};
use std::collections::HashSet;
use tree_sitter::Node;

/// Declarations that own the calls in their body. Closures do not: their
/// calls belong to the enclosing declaration.
const CALL_OWNERS: &[&str] = &["function_definition", "method_declaration"];

/// Which calls under the queried node belong to the record being built.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CallScope {
    /// Calls whose nearest owning declaration has this node id
    Declaration(usize),
    /// Calls outside every function and class
    FileLevel,
}

impl CallScope {
    fn contains(self, call: &Node) -> bool {
        match self {
            CallScope::Declaration(id) => {
                enclosing(call, CALL_OWNERS).is_some_and(|owner| owner.id() == id)
            }
            CallScope::FileLevel => {
                enclosing(call, CALL_OWNERS).is_none() && enclosing(call, CLASS_KINDS).is_none()
            }
        }
    }
}

/// Classify a call by its target name.
///
/// A `$`-prefixed name is DYNAMIC whatever else it matches. Builtin and magic
/// names only count as such when the file does not declare them itself.
pub fn guess_method_type(name: &str, is_native: bool, is_class_method: bool) -> MethodType {
    if name.starts_with('$') {
        return MethodType::Dynamic;
    }
    if is_class_method {
        if name.eq_ignore_ascii_case(CONSTRUCTOR) {
            MethodType::Construct
        } else if is_magic_method(name) {
            if is_native {
                MethodType::Magic
            } else {
                MethodType::Builtin
            }
        } else {
            MethodType::ClassMethod
        }
    } else if !is_native && is_builtin_function(name) {
        MethodType::Builtin
    } else {
        MethodType::General
    }
}

/// Call sites under `node` that belong to `scope`, in document order,
/// deduplicated by (name, start line).
pub(crate) fn extract_calls(
    ctx: &FileContext,
    node: &Node,
    scope: CallScope,
    class: Option<&ClassContext>,
) -> Vec<CallSite> {
    let mut seen = HashSet::new();
    captures(&ctx.queries.calls, *node, ctx.source)
        .iter()
        .filter_map(|m| first(m, "call"))
        .filter(|call| scope.contains(call))
        .filter_map(|call| build_call(ctx, &call, class))
        .filter(|call| seen.insert((call.name.clone(), call.start_line)))
        .collect()
}

/// Synthetic declaration holding the file's top-level calls, if it has any.
pub(crate) fn extract_file_level(ctx: &FileContext, root: &Node) -> Option<MethodRecord> {
    let calls = extract_calls(ctx, root, CallScope::FileLevel, None);
    if calls.is_empty() {
        return None;
    }
    Some(MethodRecord {
        id: String::new(),
        name: NOT_IN_METHOD.to_string(),
        fullname: NOT_IN_METHOD.to_string(),
        class_name: None,
        file: String::new(),
        namespace: None,
        start_line: 1,
        end_line: ctx.file_end,
        visibility: Visibility::Public,
        modifiers: Vec::new(),
        parameters: Vec::new(),
        return_type: None,
        return_values: Vec::new(),
        method_type: MethodType::General,
        calls,
        called_by: Vec::new(),
    })
}

fn build_call(ctx: &FileContext, node: &Node, class: Option<&ClassContext>) -> Option<CallSite> {
    let mut call = match node.kind() {
        "function_call_expression" => function_call(ctx, node)?,
        "member_call_expression" | "nullsafe_member_call_expression" => {
            member_call(ctx, node, class)?
        }
        "scoped_call_expression" => scoped_call(ctx, node, class)?,
        "object_creation_expression" => construction(ctx, node, class)?,
        _ => return None,
    };

    call.start_line = start_line(node);
    call.end_line = super::syntax::end_line(node);
    call.arguments = node
        .child_by_field_name("arguments")
        .or_else(|| find_child_by_kind(node, "arguments"))
        .map(|args| extract_arguments(&args, ctx.source))
        .unwrap_or_default();
    Some(call)
}

/// `foo(...)`, `\App\foo(...)`, `$fn(...)`
fn function_call(ctx: &FileContext, node: &Node) -> Option<CallSite> {
    let function = node.child_by_field_name("function")?;
    let text = node_text(&function, ctx.source)?;

    if !matches!(function.kind(), "name" | "qualified_name") {
        // Variables, closures and other expressions are not statically known
        return Some(CallSite::new(text.clone(), text, MethodType::Dynamic));
    }

    let fullname = text.trim_start_matches('\\').to_string();
    let name = last_segment(&fullname).to_string();
    let is_native = ctx.is_local_function(&name);
    let mut call = CallSite::new(
        name.clone(),
        fullname,
        guess_method_type(&name, is_native, false),
    );
    call.is_native = is_native;
    Some(call)
}

/// `$obj->method(...)` and `$obj?->method(...)`
fn member_call(ctx: &FileContext, node: &Node, class: Option<&ClassContext>) -> Option<CallSite> {
    let object = field_text(node, "object", ctx.source)?;
    let name = field_text(node, "name", ctx.source)?;

    let (class_name, is_native) = if object == "$this" {
        match class {
            Some(class) => (Some(class.name.clone()), true),
            None => (None, false),
        }
    } else {
        match ctx.bound_class(&object, node) {
            Some(bound) => (Some(bound.to_string()), ctx.is_local_class(bound)),
            None => (None, false),
        }
    };

    let mut call = CallSite::new(
        name.clone(),
        format!("{}->{}", object, name),
        guess_method_type(&name, is_native, true),
    );
    call.object = Some(object);
    call.class_name = class_name;
    call.is_native = is_native;
    Some(call)
}

/// `Cls::method(...)`, `self::method(...)`, `parent::__construct(...)`
fn scoped_call(ctx: &FileContext, node: &Node, class: Option<&ClassContext>) -> Option<CallSite> {
    let scope = field_text(node, "scope", ctx.source)?;
    let name = field_text(node, "name", ctx.source)?;

    let (class_name, is_native) = match scope.to_ascii_lowercase().as_str() {
        "self" | "static" => match class {
            Some(class) => (Some(class.name.clone()), true),
            None => (None, false),
        },
        "parent" => match class.and_then(|c| c.parent.as_deref()) {
            Some(parent) => (Some(parent.to_string()), ctx.is_local_class(parent)),
            None => (None, false),
        },
        _ if scope.starts_with('$') => match ctx.bound_class(&scope, node) {
            Some(bound) => (Some(bound.to_string()), ctx.is_local_class(bound)),
            None => (None, false),
        },
        _ => {
            let class_name = last_segment(&scope).to_string();
            let is_native = ctx.is_local_class(&class_name);
            (Some(class_name), is_native)
        }
    };

    let fullname = format!("{}::{}", class_name.as_deref().unwrap_or(&scope), name);
    let mut call = CallSite::new(
        name.clone(),
        fullname,
        guess_method_type(&name, is_native, true),
    );
    call.object = Some(scope);
    call.class_name = class_name;
    call.modifiers = vec![Modifier::Static];
    call.is_native = is_native;
    Some(call)
}

/// `new Foo(...)`. Anonymous classes yield no call site.
fn construction(ctx: &FileContext, node: &Node, class: Option<&ClassContext>) -> Option<CallSite> {
    let designator = constructed_type(node)?;
    let text = node_text(&designator, ctx.source)?;

    if !matches!(designator.kind(), "name" | "qualified_name") {
        let mut call = CallSite::new(
            text.clone(),
            format!("{}::{}", text, CONSTRUCTOR),
            MethodType::Dynamic,
        );
        call.object = Some(text);
        return Some(call);
    }

    let class_name = match text.to_ascii_lowercase().as_str() {
        "self" | "static" => class.map(|c| c.name.clone()),
        "parent" => class.and_then(|c| c.parent.clone()),
        _ => Some(last_segment(&text).to_string()),
    }?;
    let is_native = ctx.is_local_class(&class_name);

    let mut call = CallSite::new(
        CONSTRUCTOR,
        format!("{}::{}", class_name, CONSTRUCTOR),
        guess_method_type(CONSTRUCTOR, is_native, true),
    );
    call.object = Some(text);
    call.class_name = Some(class_name);
    call.is_native = is_native;
    Some(call)
}

/// The class expression after `new`, or `None` for anonymous classes.
pub(crate) fn constructed_type<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let designator = node
        .named_children(&mut cursor)
        .find(|c| !matches!(c.kind(), "arguments" | "attribute_list" | "comment"));
    designator.filter(|d| {
        !matches!(
            d.kind(),
            "anonymous_class" | "declaration_list" | "base_clause" | "class_interface_clause"
        )
    })
}

/// Positional argument list: value text only, plus the literal shape of
/// constant arguments.
fn extract_arguments(arguments: &Node, source: &str) -> Vec<Parameter> {
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|arg| arg.kind() != "comment")
        .enumerate()
        .map(|(index, arg)| {
            let declared_name = field_text(&arg, "name", source);
            let expr = if arg.kind() == "argument" {
                last_named_child(&arg).unwrap_or(arg)
            } else {
                arg
            };
            // `foo($x = 5)` passes the assigned value
            let value_node = if expr.kind() == "assignment_expression" {
                expr.child_by_field_name("right").unwrap_or(expr)
            } else {
                expr
            };
            Parameter {
                index,
                name: Some(declared_name.unwrap_or_else(|| format!("$arg{}", index))),
                param_type: literal_shape(&value_node),
                default: None,
                value: node_text(&value_node, source),
                variadic: expr.kind() == "variadic_unpacking",
            }
        })
        .collect()
}
