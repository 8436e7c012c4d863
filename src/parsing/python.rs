//! Python extractor: `import`/`from ... import` statements, `def`/`class`
//! declarations, and the `__all__` export-list convention (spec.md §4.4).

use super::{check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult, SymbolRecord};
use crate::types::SymbolKind;
use tree_sitter::Node;

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = ParseResult::default();
    let mut all_list: Option<Vec<String>> = None;
    walk(root, source, 0, None, &mut result, &mut all_list);
    apply_exports(&mut result, all_list);
    result
}

fn apply_exports(result: &mut ParseResult, all_list: Option<Vec<String>>) {
    match all_list {
        Some(names) => {
            result.exports = names
                .into_iter()
                .map(|name| ExportRecord {
                    name,
                    is_default: false,
                    is_re_export: false,
                    source: None,
                })
                .collect();
        }
        None => {
            result.exports = result
                .symbols
                .iter()
                .filter(|s| matches!(s.kind, SymbolKind::Function | SymbolKind::Class))
                .filter(|s| !s.name.starts_with('_') && !s.name.contains('.'))
                .map(|s| ExportRecord {
                    name: s.name.clone(),
                    is_default: false,
                    is_re_export: false,
                    source: None,
                })
                .collect();
        }
    }
}

fn walk(
    node: Node,
    source: &str,
    depth: usize,
    enclosing_class: Option<&str>,
    result: &mut ParseResult,
    all_list: &mut Option<Vec<String>>,
) {
    if !check_recursion_depth(depth, &mut result.diagnostics) {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source);
                let (kind, full_name) = match enclosing_class {
                    Some(c) => (SymbolKind::Method, format!("{c}.{name}")),
                    None => (SymbolKind::Function, name.to_string()),
                };
                result.symbols.push(SymbolRecord {
                    kind,
                    name: full_name,
                    signature: signature_line(child, source),
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: docstring(child, source),
                });
            }
            "class_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source).to_string();
                let mut bases = Vec::new();
                if let Some(args) = child.child_by_field_name("superclasses") {
                    let mut c = args.walk();
                    for a in args.children(&mut c) {
                        if a.kind() == "identifier" || a.kind() == "attribute" {
                            bases.push(node_text(a, source).to_string());
                        }
                    }
                }
                result.symbols.push(SymbolRecord {
                    kind: SymbolKind::Class,
                    name: name.clone(),
                    signature: signature_line(child, source),
                    range: node_range(child),
                    extends: bases.first().cloned(),
                    implements: bases.into_iter().skip(1).collect(),
                    doc_comment: docstring(child, source),
                });
                if let Some(body) = child.child_by_field_name("body") {
                    walk(body, source, depth + 1, Some(&name), result, all_list);
                }
                continue;
            }
            "decorated_definition" => {
                walk(child, source, depth + 1, enclosing_class, result, all_list);
            }
            "expression_statement" => {
                if let Some(assignment) = child.child(0) {
                    if assignment.kind() == "assignment" {
                        maybe_capture_all(assignment, source, all_list);
                    }
                }
            }
            "import_statement" => extract_import(child, source, result),
            "import_from_statement" => extract_import_from(child, source, result),
            "module" | "block" => {
                walk(child, source, depth + 1, enclosing_class, result, all_list);
            }
            _ => {}
        }
    }
}

fn maybe_capture_all(node: Node, source: &str, all_list: &mut Option<Vec<String>>) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    if node_text(left, source) != "__all__" {
        return;
    }
    let Some(right) = node.child_by_field_name("right") else {
        return;
    };
    if right.kind() != "list" {
        return;
    }
    let mut names = Vec::new();
    let mut cursor = right.walk();
    for item in right.children(&mut cursor) {
        if item.kind() == "string" {
            let text = node_text(item, source);
            names.push(text.trim_matches(|c| c == '"' || c == '\'').to_string());
        }
    }
    *all_list = Some(names);
}

fn signature_line(node: Node, source: &str) -> Option<String> {
    let text = node_text(node, source);
    Some(text.lines().next().unwrap_or(text).trim_end_matches(':').trim().to_string())
}

fn docstring(def_node: Node, source: &str) -> Option<String> {
    let body = def_node.child_by_field_name("body")?;
    let first = body.child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    let text = node_text(expr, source);
    Some(
        text.trim_matches(|c| c == '"' || c == '\'')
            .trim()
            .to_string(),
    )
}

fn extract_import(node: Node, source: &str, result: &mut ParseResult) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let full = node_text(child, source);
                let last = full.rsplit('.').next().unwrap_or(full);
                result.imports.push(ImportRecord {
                    source: full.to_string(),
                    names: vec![last.to_string()],
                    is_default: true,
                    ..Default::default()
                });
            }
            "aliased_import" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let Some(alias_node) = child.child_by_field_name("alias") else {
                    continue;
                };
                let full = node_text(name_node, source).to_string();
                let alias = node_text(alias_node, source).to_string();
                result.imports.push(ImportRecord {
                    source: full,
                    names: vec![alias],
                    is_default: true,
                    ..Default::default()
                });
            }
            _ => {}
        }
    }
}

fn extract_import_from(node: Node, source: &str, result: &mut ParseResult) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };
    let module_source = node_text(module_node, source).to_string();

    let mut names = Vec::new();
    let mut is_namespace = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "wildcard_import" => is_namespace = true,
            "dotted_name" if child.id() != module_node.id() => {
                names.push(node_text(child, source).to_string());
            }
            "aliased_import" => {
                if let Some(alias) = child.child_by_field_name("alias") {
                    names.push(node_text(alias, source).to_string());
                } else if let Some(name) = child.child_by_field_name("name") {
                    names.push(node_text(name, source).to_string());
                }
            }
            _ => {}
        }
    }

    result.imports.push(ImportRecord {
        source: module_source,
        names,
        is_default: false,
        is_namespace,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::dispatcher::parse_file;
    use crate::types::Language;

    #[test]
    fn scenario_from_os_import_path_environ() {
        let result = parse_file("from os import path, environ\n", "py", Language::Python);
        assert_eq!(result.imports.len(), 1);
        let imp = &result.imports[0];
        assert_eq!(imp.source, "os");
        assert_eq!(imp.names, vec!["path", "environ"]);
        assert!(!imp.is_default);
        assert!(!imp.is_namespace);
    }

    #[test]
    fn scenario_all_exports_exactly_user() {
        let src = "__all__ = [\"User\"]\nclass User: pass\nclass Admin: pass\n";
        let result = parse_file(src, "py", Language::Python);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "User");
    }

    #[test]
    fn scenario_class_extends_and_implements() {
        let src = "class AdminService(UserService, Mixin): pass\n";
        let result = parse_file(src, "py", Language::Python);
        assert_eq!(result.symbols.len(), 1);
        let sym = &result.symbols[0];
        assert_eq!(sym.name, "AdminService");
        assert_eq!(sym.extends.as_deref(), Some("UserService"));
        assert_eq!(sym.implements, vec!["Mixin".to_string()]);
    }

    #[test]
    fn relative_import_preserves_dots() {
        let result = parse_file("from .models import User\n", "py", Language::Python);
        assert_eq!(result.imports[0].source, ".models");
    }
}
