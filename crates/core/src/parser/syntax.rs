//! Structural queries over a parsed PHP tree
//!
//! [`QuerySet`] compiles every pattern the extractors use exactly once; the
//! compiled set is immutable and shared by reference across parsing workers.
//! [`captures`] turns query matches into label -> nodes maps, which is the
//! only shape the extractors consume.

use super::ParseError;
use std::collections::HashMap;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Query, QueryCursor};

/// Every function declaration, wherever it is nested.
const FUNCTION_PATTERN: &str = "(function_definition) @function";

const CLASS_PATTERN: &str = r#"
[
  (class_declaration)
  (interface_declaration)
  (trait_declaration)
  (enum_declaration)
] @class
"#;

const CALL_PATTERN: &str = r#"
[
  (function_call_expression)
  (member_call_expression)
  (nullsafe_member_call_expression)
  (scoped_call_expression)
  (object_creation_expression)
] @call
"#;

const RETURN_PATTERN: &str = "(return_statement) @return";

/// `$x = new Foo()` and `function f(Foo $x)`
const BINDING_PATTERN: &str = r#"
(assignment_expression
  left: (variable_name) @object
  right: (object_creation_expression) @creation)

(simple_parameter
  type: (named_type) @param_type
  name: (variable_name) @param_object)
"#;

const USE_PATTERN: &str = "(namespace_use_declaration) @use";

const INCLUDE_PATTERN: &str = r#"
[
  (include_expression)
  (include_once_expression)
  (require_expression)
  (require_once_expression)
] @include
"#;

const VARIABLE_PATTERN: &str = r#"
(subscript_expression (variable_name) @superglobal)

(global_declaration) @global

(function_static_declaration) @static

(const_declaration) @const

(function_call_expression
  function: (name) @define_fn
  arguments: (arguments) @define_args)

(assignment_expression
  left: (variable_name) @assign_target
  right: (_) @assign_value)
"#;

/// Compiled queries shared by every extractor
pub struct QuerySet {
    pub functions: Query,
    pub classes: Query,
    pub calls: Query,
    pub returns: Query,
    pub bindings: Query,
    pub uses: Query,
    pub includes: Query,
    pub variables: Query,
}

impl QuerySet {
    pub fn new(language: &Language) -> Result<Self, ParseError> {
        let compile = |pattern: &str| {
            Query::new(language, pattern).map_err(|e| ParseError::Query(e.to_string()))
        };
        Ok(Self {
            functions: compile(FUNCTION_PATTERN)?,
            classes: compile(CLASS_PATTERN)?,
            calls: compile(CALL_PATTERN)?,
            returns: compile(RETURN_PATTERN)?,
            bindings: compile(BINDING_PATTERN)?,
            uses: compile(USE_PATTERN)?,
            includes: compile(INCLUDE_PATTERN)?,
            variables: compile(VARIABLE_PATTERN)?,
        })
    }
}

/// One query match: capture label -> captured nodes.
pub type Captures<'q, 't> = HashMap<&'q str, Vec<Node<'t>>>;

/// Run `query` under `node` and group each match's captures by label.
///
/// Matches come back in document order of their first capture.
pub fn captures<'q, 't>(query: &'q Query, node: Node<'t>, source: &str) -> Vec<Captures<'q, 't>> {
    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, node, source.as_bytes());

    let mut result = Vec::new();
    while let Some(m) = matches.next() {
        let mut groups: Captures<'q, 't> = HashMap::new();
        for capture in m.captures {
            groups
                .entry(names[capture.index as usize])
                .or_default()
                .push(capture.node);
        }
        result.push(groups);
    }
    result
}

/// First node captured under `label`, if any.
pub fn first<'t>(captures: &Captures<'_, 't>, label: &str) -> Option<Node<'t>> {
    captures.get(label).and_then(|nodes| nodes.first().copied())
}

// --- Node helpers ---

pub fn node_text(node: &Node, source: &str) -> Option<String> {
    node.utf8_text(source.as_bytes())
        .ok()
        .map(|s| s.to_string())
}

pub fn field_text(node: &Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| node_text(&n, source))
}

pub fn find_child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).find(|c| c.kind() == kind);
    result
}

pub fn children_by_kind<'a>(node: &Node<'a>, kinds: &[&str]) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| kinds.contains(&c.kind()))
        .collect()
}

pub fn last_named_child<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    let count = node.named_child_count();
    if count == 0 {
        return None;
    }
    node.named_child(count - 1)
}

/// 1-based first line of `node`.
pub fn start_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// 1-based last line of `node`.
pub fn end_line(node: &Node) -> usize {
    node.end_position().row + 1
}

/// Nearest proper ancestor whose kind is one of `kinds`.
pub fn enclosing<'a>(node: &Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if kinds.contains(&parent.kind()) {
            return Some(parent);
        }
        current = parent.parent();
    }
    None
}

/// Last `\`-separated segment of a possibly qualified name.
pub fn last_segment(name: &str) -> &str {
    let trimmed = name.trim_start_matches('\\');
    trimmed.rsplit('\\').next().unwrap_or(trimmed)
}

/// Type name implied by the syntax of a literal expression.
pub fn literal_shape(node: &Node) -> Option<String> {
    let shape = match node.kind() {
        "string" | "encapsed_string" | "heredoc" | "nowdoc" => "string",
        "integer" => "int",
        "float" => "float",
        "boolean" => "bool",
        "null" => "null",
        "array_creation_expression" => "array",
        _ => return None,
    };
    Some(shape.to_string())
}
