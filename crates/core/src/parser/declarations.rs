//! Namespaces, functions and class-like declarations

use super::calls::{self, CallScope};
use super::syntax::{
    captures, children_by_kind, end_line, enclosing, field_text, find_child_by_kind, first,
    last_named_child, last_segment, literal_shape, node_text, start_line,
};
use super::FileContext;
use crate::builtins::{is_magic_method, CONSTRUCTOR};
use crate::model::{
    ClassKind, ClassRecord, ClassRef, MethodRecord, MethodType, Modifier, NamespaceRecord,
    Parameter, PropertyRecord, Visibility,
};
use std::collections::HashSet;
use tree_sitter::Node;

/// Node kinds that start a function scope, named or anonymous.
pub(crate) const FUNCTION_SCOPES: &[&str] = &[
    "function_definition",
    "method_declaration",
    "anonymous_function",
    "anonymous_function_creation_expression",
    "arrow_function",
];

/// Named declarations that open a fresh variable scope.
pub(crate) const DECLARATION_SCOPES: &[&str] = &["function_definition", "method_declaration"];

pub(crate) const CLASS_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "trait_declaration",
    "enum_declaration",
];

/// The class a method body belongs to, for `$this`, `self` and `parent`.
#[derive(Debug, Clone)]
pub(crate) struct ClassContext {
    pub name: String,
    pub parent: Option<String>,
}

/// Namespace declarations with their line extents.
///
/// A braced namespace spans its block. An unbraced one runs until the line
/// before the next namespace declaration, or to the end of the file.
pub(crate) fn extract_namespaces(root: &Node, source: &str) -> Vec<NamespaceRecord> {
    let mut cursor = root.walk();
    let definitions: Vec<Node> = root
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "namespace_definition")
        .collect();
    let file_end = end_line(root);

    definitions
        .iter()
        .enumerate()
        .map(|(i, def)| {
            let name = field_text(def, "name", source)
                .or_else(|| find_child_by_kind(def, "namespace_name").and_then(|n| node_text(&n, source)))
                .map(|n| n.trim_start_matches('\\').to_string())
                .unwrap_or_default();
            let start = start_line(def);
            let end = if def.child_by_field_name("body").is_some()
                || find_child_by_kind(def, "compound_statement").is_some()
            {
                end_line(def)
            } else {
                match definitions.get(i + 1) {
                    Some(next) => start_line(next).saturating_sub(1).max(start),
                    None => file_end.max(start),
                }
            };
            NamespaceRecord {
                name,
                start_line: start,
                end_line: end,
            }
        })
        .collect()
}

/// Names of functions and class-likes declared anywhere in the file.
pub(crate) fn declared_names(ctx: &FileContext, root: &Node) -> (HashSet<String>, HashSet<String>) {
    let functions = captures(&ctx.queries.functions, *root, ctx.source)
        .iter()
        .filter_map(|m| first(m, "function"))
        .filter_map(|n| field_text(&n, "name", ctx.source))
        .collect();
    let classes = captures(&ctx.queries.classes, *root, ctx.source)
        .iter()
        .filter_map(|m| first(m, "class"))
        .filter_map(|n| field_text(&n, "name", ctx.source))
        .collect();
    (functions, classes)
}

/// Every free function in the file, including conditionally declared and
/// nested ones (PHP hoists them all to the global function table).
pub(crate) fn extract_functions(ctx: &FileContext, root: &Node) -> Vec<MethodRecord> {
    captures(&ctx.queries.functions, *root, ctx.source)
        .iter()
        .filter_map(|m| first(m, "function"))
        .filter_map(|node| extract_declaration(ctx, &node, None))
        .collect()
}

pub(crate) fn extract_classes(ctx: &FileContext, root: &Node) -> Vec<ClassRecord> {
    captures(&ctx.queries.classes, *root, ctx.source)
        .iter()
        .filter_map(|m| first(m, "class"))
        .filter_map(|node| extract_class(ctx, &node))
        .collect()
}

fn extract_class(ctx: &FileContext, node: &Node) -> Option<ClassRecord> {
    let source = ctx.source;
    let name = field_text(node, "name", source)?;
    let kind = match node.kind() {
        "interface_declaration" => ClassKind::Interface,
        "trait_declaration" => ClassKind::Trait,
        "enum_declaration" => ClassKind::Enum,
        _ => ClassKind::Class,
    };
    let (visibility, modifiers) = declaration_modifiers(node, source);

    let extends = find_child_by_kind(node, "base_clause")
        .map(|clause| type_names(&clause, source))
        .unwrap_or_default();
    let implements = find_child_by_kind(node, "class_interface_clause")
        .map(|clause| type_names(&clause, source))
        .unwrap_or_default();

    let class_ctx = ClassContext {
        name: name.clone(),
        parent: extends.first().map(|r: &ClassRef| r.name.clone()),
    };

    let mut record = ClassRecord {
        id: String::new(),
        namespace: ctx.namespace_at(start_line(node)),
        name,
        kind,
        file: String::new(),
        start_line: start_line(node),
        end_line: end_line(node),
        visibility,
        modifiers,
        extends,
        implements,
        uses: Vec::new(),
        properties: Vec::new(),
        methods: Vec::new(),
        is_interface: kind == ClassKind::Interface,
    };

    let body = node
        .child_by_field_name("body")
        .or_else(|| find_child_by_kind(node, "declaration_list"))
        .or_else(|| find_child_by_kind(node, "enum_declaration_list"));
    let Some(body) = body else {
        return Some(record);
    };

    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_declaration" => {
                if let Some(method) = extract_declaration(ctx, &member, Some(&class_ctx)) {
                    if method.name.eq_ignore_ascii_case(CONSTRUCTOR) {
                        record
                            .properties
                            .extend(promoted_properties(&member, source));
                    }
                    record.methods.push(method);
                }
            }
            "property_declaration" => {
                record.properties.extend(extract_properties(&member, source));
            }
            "const_declaration" => {
                record.properties.extend(extract_class_constants(&member, source));
            }
            "use_declaration" => {
                record.uses.extend(type_names(&member, source));
            }
            _ => {}
        }
    }

    Some(record)
}

/// Build a function or method record, including its call sites.
pub(crate) fn extract_declaration(
    ctx: &FileContext,
    node: &Node,
    class: Option<&ClassContext>,
) -> Option<MethodRecord> {
    let source = ctx.source;
    let name = field_text(node, "name", source)?;
    let (visibility, modifiers) = declaration_modifiers(node, source);
    let is_static = modifiers.contains(&Modifier::Static);

    let (fullname, method_type) = match class {
        Some(class) => (
            method_fullname(&class.name, &name, is_static),
            declared_method_type(&name),
        ),
        None => (name.clone(), MethodType::General),
    };

    let parameters = node
        .child_by_field_name("parameters")
        .or_else(|| find_child_by_kind(node, "formal_parameters"))
        .map(|list| extract_parameters(&list, source))
        .unwrap_or_default();

    let body = node
        .child_by_field_name("body")
        .or_else(|| find_child_by_kind(node, "compound_statement"));
    let (return_values, calls) = match body {
        Some(body) => (
            return_values(ctx, node, &body),
            calls::extract_calls(ctx, &body, CallScope::Declaration(node.id()), class),
        ),
        None => (Vec::new(), Vec::new()),
    };

    Some(MethodRecord {
        id: String::new(),
        namespace: ctx.namespace_at(start_line(node)),
        name,
        fullname,
        class_name: class.map(|c| c.name.clone()),
        file: String::new(),
        start_line: start_line(node),
        end_line: end_line(node),
        visibility,
        modifiers,
        parameters,
        return_type: extract_return_type(node, source),
        return_values,
        method_type,
        calls,
        called_by: Vec::new(),
    })
}

/// `Class::name` for static methods and constructors, `Class->name` otherwise.
pub fn method_fullname(class: &str, name: &str, is_static: bool) -> String {
    if name.eq_ignore_ascii_case(CONSTRUCTOR) {
        format!("{}::{}", class, CONSTRUCTOR)
    } else if is_static {
        format!("{}::{}", class, name)
    } else {
        format!("{}->{}", class, name)
    }
}

fn declared_method_type(name: &str) -> MethodType {
    if name.eq_ignore_ascii_case(CONSTRUCTOR) {
        MethodType::Construct
    } else if is_magic_method(name) {
        MethodType::Magic
    } else {
        MethodType::ClassMethod
    }
}

fn return_values(ctx: &FileContext, decl: &Node, body: &Node) -> Vec<String> {
    captures(&ctx.queries.returns, *body, ctx.source)
        .iter()
        .filter_map(|m| first(m, "return"))
        .filter(|ret| enclosing(ret, FUNCTION_SCOPES).is_some_and(|scope| scope.id() == decl.id()))
        .filter_map(|ret| ret.named_child(0))
        .filter_map(|expr| node_text(&expr, ctx.source))
        .collect()
}

/// Visibility keyword and modifier set of a declaration node.
pub(crate) fn declaration_modifiers(node: &Node, source: &str) -> (Visibility, Vec<Modifier>) {
    let mut visibility = Visibility::Public;
    let mut modifiers = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let keyword = match child.kind() {
            "visibility_modifier" | "static_modifier" | "abstract_modifier" | "final_modifier"
            | "readonly_modifier" => node_text(&child, source),
            _ if !child.is_named() => node_text(&child, source),
            _ => None,
        };
        let Some(keyword) = keyword else { continue };

        if let Some(v) = Visibility::from_keyword(&keyword) {
            visibility = v;
        } else if let Some(m) = Modifier::from_keyword(&keyword) {
            if !modifiers.contains(&m) {
                modifiers.push(m);
            }
        }
    }

    (visibility, modifiers)
}

/// Names listed in an extends/implements/trait-use clause.
fn type_names(clause: &Node, source: &str) -> Vec<ClassRef> {
    children_by_kind(clause, &["name", "qualified_name"])
        .iter()
        .filter_map(|n| node_text(n, source))
        .map(|text| ClassRef::new(last_segment(&text)))
        .collect()
}

/// Declared parameters of a `formal_parameters` list.
pub(crate) fn extract_parameters(list: &Node, source: &str) -> Vec<Parameter> {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|child| {
            matches!(
                child.kind(),
                "simple_parameter" | "property_promotion_parameter" | "variadic_parameter"
            )
        })
        .enumerate()
        .map(|(index, child)| Parameter {
            index,
            name: field_text(&child, "name", source),
            param_type: field_text(&child, "type", source),
            default: field_text(&child, "default_value", source),
            value: None,
            variadic: child.kind() == "variadic_parameter",
        })
        .collect()
}

fn extract_return_type(node: &Node, source: &str) -> Option<String> {
    // The field may wrap the type together with its `:`
    field_text(node, "return_type", source)
        .map(|s| s.trim_start_matches(':').trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_properties(node: &Node, source: &str) -> Vec<PropertyRecord> {
    let (visibility, modifiers) = declaration_modifiers(node, source);
    let declared_type = field_text(node, "type", source).or_else(|| {
        children_by_kind(
            node,
            &["primitive_type", "named_type", "optional_type", "union_type", "nullable_type"],
        )
        .first()
        .and_then(|t| node_text(t, source))
    });

    children_by_kind(node, &["property_element"])
        .iter()
        .filter_map(|element| {
            let name = find_child_by_kind(element, "variable_name")
                .and_then(|n| node_text(&n, source))?;
            let default_node = element
                .child_by_field_name("default_value")
                .or_else(|| {
                    find_child_by_kind(element, "property_initializer")
                        .and_then(|init| init.named_child(0))
                })
                .or_else(|| last_named_child(element).filter(|n| n.kind() != "variable_name"));

            Some(PropertyRecord {
                name,
                default: default_node.and_then(|d| node_text(&d, source)),
                prop_type: declared_type
                    .clone()
                    .or_else(|| default_node.and_then(|d| literal_shape(&d))),
                start_line: start_line(element),
                end_line: end_line(element),
                visibility,
                modifiers: modifiers.clone(),
            })
        })
        .collect()
}

fn extract_class_constants(node: &Node, source: &str) -> Vec<PropertyRecord> {
    let (visibility, mut modifiers) = declaration_modifiers(node, source);
    if !modifiers.contains(&Modifier::Const) {
        modifiers.push(Modifier::Const);
    }

    children_by_kind(node, &["const_element"])
        .iter()
        .filter_map(|element| {
            let name = find_child_by_kind(element, "name").and_then(|n| node_text(&n, source))?;
            let value = last_named_child(element).filter(|n| n.kind() != "name");
            Some(PropertyRecord {
                name,
                default: value.and_then(|v| node_text(&v, source)),
                prop_type: value.and_then(|v| literal_shape(&v)),
                start_line: start_line(element),
                end_line: end_line(element),
                visibility,
                modifiers: modifiers.clone(),
            })
        })
        .collect()
}

/// Constructor parameters with a visibility keyword are properties too.
fn promoted_properties(method: &Node, source: &str) -> Vec<PropertyRecord> {
    let Some(list) = method.child_by_field_name("parameters") else {
        return Vec::new();
    };
    children_by_kind(&list, &["property_promotion_parameter"])
        .iter()
        .filter_map(|param| {
            let (visibility, modifiers) = declaration_modifiers(param, source);
            let visibility = find_child_by_kind(param, "visibility_modifier")
                .and_then(|v| node_text(&v, source))
                .and_then(|v| Visibility::from_keyword(&v))
                .unwrap_or(visibility);
            Some(PropertyRecord {
                name: field_text(param, "name", source)?,
                default: field_text(param, "default_value", source),
                prop_type: field_text(param, "type", source),
                start_line: start_line(param),
                end_line: end_line(param),
                visibility,
                modifiers,
            })
        })
        .collect()
}
