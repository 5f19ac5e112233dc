//! `use` declarations and include/require expressions

use super::syntax::{captures, end_line, field_text, find_child_by_kind, first, last_named_child, node_text, start_line};
use super::FileContext;
use crate::model::{ImportKind, ImportRecord};
use tree_sitter::Node;

const USE_CLAUSES: &[&str] = &["namespace_use_clause", "namespace_use_group_clause"];

/// Imports in document order: `use` clauses first, then file imports.
pub(crate) fn extract_imports(ctx: &FileContext, root: &Node) -> Vec<ImportRecord> {
    let mut imports: Vec<ImportRecord> = captures(&ctx.queries.uses, *root, ctx.source)
        .iter()
        .filter_map(|m| first(m, "use"))
        .flat_map(|decl| use_records(&decl, ctx.source))
        .collect();

    imports.extend(
        captures(&ctx.queries.includes, *root, ctx.source)
            .iter()
            .filter_map(|m| first(m, "include"))
            .filter_map(|node| include_record(&node, ctx.source)),
    );
    imports
}

/// One record per imported name; group uses are expanded with their prefix.
fn use_records(decl: &Node, source: &str) -> Vec<ImportRecord> {
    let text = node_text(decl, source).unwrap_or_default();
    let decl_kind = use_kind(decl);
    // `use App\{A, B}` carries the shared prefix on the declaration itself
    let prefix = decl
        .child_by_field_name("prefix")
        .or_else(|| find_child_by_kind(decl, "namespace_name"))
        .and_then(|n| node_text(&n, source))
        .map(|p| p.trim_matches('\\').to_string());

    let mut clauses = Vec::new();
    collect_clauses(decl, &mut clauses);

    clauses
        .iter()
        .filter_map(|clause| {
            let path = {
                let mut cursor = clause.walk();
                let found = clause
                    .named_children(&mut cursor)
                    .find(|c| matches!(c.kind(), "name" | "qualified_name" | "namespace_name"))
                    .and_then(|n| node_text(&n, source));
                found
            }?;
            let path = path.trim_start_matches('\\');
            let use_from = match &prefix {
                Some(prefix) if !prefix.is_empty() => format!("{}\\{}", prefix, path),
                _ => path.to_string(),
            };
            let namespace = use_from.rsplit_once('\\').map(|(ns, _)| ns.to_string());
            let alias = field_text(clause, "alias", source).or_else(|| {
                find_child_by_kind(clause, "namespace_aliasing_clause")
                    .and_then(|a| find_child_by_kind(&a, "name"))
                    .and_then(|n| node_text(&n, source))
            });

            Some(ImportRecord {
                kind: use_kind(clause).unwrap_or(decl_kind.unwrap_or(ImportKind::UseClass)),
                start_line: start_line(decl),
                end_line: end_line(decl),
                namespace,
                path: None,
                use_from: Some(use_from),
                alias,
                text: text.clone(),
            })
        })
        .collect()
}

fn collect_clauses<'a>(node: &Node<'a>, out: &mut Vec<Node<'a>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if USE_CLAUSES.contains(&child.kind()) {
            out.push(child);
        } else if child.kind() == "namespace_use_group" {
            collect_clauses(&child, out);
        }
    }
}

/// `function` or `const` keyword directly under `node`, if present.
fn use_kind(node: &Node) -> Option<ImportKind> {
    let mut cursor = node.walk();
    let kind = node.children(&mut cursor).find_map(|c| match c.kind() {
        "function" => Some(ImportKind::UseFunction),
        "const" => Some(ImportKind::UseConst),
        _ => None,
    });
    kind
}

fn include_record(node: &Node, source: &str) -> Option<ImportRecord> {
    let kind = match node.kind() {
        "include_expression" => ImportKind::Include,
        "include_once_expression" => ImportKind::IncludeOnce,
        "require_expression" => ImportKind::Require,
        "require_once_expression" => ImportKind::RequireOnce,
        _ => return None,
    };
    let path = last_named_child(node)
        .and_then(|expr| node_text(&expr, source))
        .map(|p| strip_parens(&p).to_string())?;

    Some(ImportRecord {
        kind,
        start_line: start_line(node),
        end_line: end_line(node),
        namespace: None,
        path: Some(path),
        use_from: None,
        alias: None,
        text: node_text(node, source).unwrap_or_default(),
    })
}

fn strip_parens(expr: &str) -> &str {
    let mut s = expr.trim();
    while s.starts_with('(') && closing_paren(s) == Some(s.len() - 1) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// Byte offset of the parenthesis closing the one at offset 0.
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::strip_parens;

    #[test]
    fn test_strip_parens() {
        assert_eq!(strip_parens("('a.php')"), "'a.php'");
        assert_eq!(strip_parens("(( 'a.php' ))"), "'a.php'");
        assert_eq!(strip_parens("__DIR__ . '/a.php'"), "__DIR__ . '/a.php'");
        assert_eq!(strip_parens("('a') . ('b')"), "('a') . ('b')");
    }
}
