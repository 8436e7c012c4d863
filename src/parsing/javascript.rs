//! JavaScript/TypeScript shared extractor core. `extract(..., is_typescript)`
//! is reused by `typescript.rs`, which layers interface/type-alias handling
//! and the `import type` flag on top (spec.md §4.4).

use super::{check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult, SymbolRecord};
use crate::types::SymbolKind;
use tree_sitter::Node;

pub fn extract(root: Node, source: &str, is_typescript: bool) -> ParseResult {
    let mut result = ParseResult::default();
    walk(root, source, 0, None, is_typescript, &mut result);
    result
}

fn signature_line(node: Node, source: &str) -> Option<String> {
    let text = node_text(node, source);
    Some(text.lines().next().unwrap_or(text).trim().to_string())
}

pub(crate) fn walk(
    node: Node,
    source: &str,
    depth: usize,
    enclosing_class: Option<&str>,
    is_typescript: bool,
    result: &mut ParseResult,
) {
    if !check_recursion_depth(depth, &mut result.diagnostics) {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_statement" => extract_import(child, source, result),
            "export_statement" => extract_export(child, source, depth, is_typescript, result),
            "program" | "statement_block" => {
                walk(child, source, depth + 1, enclosing_class, is_typescript, result);
            }
            _ => process_decl(child, source, depth, is_typescript, result),
        }
    }
}

/// Dispatches on a declaration node's own kind — shared by the top-level
/// walk loop (called on each child) and `extract_export` (called directly
/// on the `declaration` field of an `export_statement`, which already *is*
/// the declaration node rather than its parent).
fn process_decl(
    node: Node,
    source: &str,
    depth: usize,
    is_typescript: bool,
    result: &mut ParseResult,
) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                result.symbols.push(SymbolRecord {
                    kind: SymbolKind::Function,
                    name: node_text(name_node, source).to_string(),
                    signature: signature_line(node, source),
                    range: node_range(node),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: leading_doc_comment(node, source),
                });
            }
        }
        "class_declaration" => extract_class(node, source, depth, is_typescript, result),
        "lexical_declaration" | "variable_declaration" => {
            let mut c2 = node.walk();
            for declarator in node.children(&mut c2) {
                if declarator.kind() == "variable_declarator" {
                    if let Some(name_node) = declarator.child_by_field_name("name") {
                        if name_node.kind() == "identifier" {
                            result.symbols.push(SymbolRecord {
                                kind: SymbolKind::Variable,
                                name: node_text(name_node, source).to_string(),
                                signature: signature_line(node, source),
                                range: node_range(node),
                                extends: None,
                                implements: Vec::new(),
                                doc_comment: None,
                            });
                        }
                    }
                }
            }
        }
        _ => {}
    }
}

fn extract_class(
    node: Node,
    source: &str,
    depth: usize,
    is_typescript: bool,
    result: &mut ParseResult,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source).to_string();

    let mut extends = None;
    let mut implements = Vec::new();
    if let Some(heritage) = node.child_by_field_name("heritage") {
        collect_heritage(heritage, source, &mut extends, &mut implements);
    } else {
        // Some grammar versions expose extends/implements clauses as direct children.
        let mut c = node.walk();
        for child in node.children(&mut c) {
            if child.kind() == "class_heritage" {
                collect_heritage(child, source, &mut extends, &mut implements);
            }
        }
    }

    result.symbols.push(SymbolRecord {
        kind: SymbolKind::Class,
        name: name.clone(),
        signature: signature_line(node, source),
        range: node_range(node),
        extends,
        implements,
        doc_comment: leading_doc_comment(node, source),
    });

    if let Some(body) = node.child_by_field_name("body") {
        walk(body, source, depth + 1, Some(&name), is_typescript, result);
        let mut c = body.walk();
        for member in body.children(&mut c) {
            if member.kind() == "method_definition" {
                if let Some(key) = member.child_by_field_name("name") {
                    result.symbols.push(SymbolRecord {
                        kind: SymbolKind::Method,
                        name: format!("{name}.{}", node_text(key, source)),
                        signature: signature_line(member, source),
                        range: node_range(member),
                        extends: None,
                        implements: Vec::new(),
                        doc_comment: leading_doc_comment(member, source),
                    });
                }
            }
        }
    }
}

fn collect_heritage(heritage: Node, source: &str, extends: &mut Option<String>, implements: &mut Vec<String>) {
    let mut cursor = heritage.walk();
    for clause in heritage.children(&mut cursor) {
        match clause.kind() {
            "extends_clause" => {
                if let Some(val) = clause.child_by_field_name("value") {
                    *extends = Some(node_text(val, source).to_string());
                } else if let Some(id) = clause.child(1) {
                    *extends = Some(node_text(id, source).to_string());
                }
            }
            "implements_clause" => {
                let mut c2 = clause.walk();
                for t in clause.children(&mut c2) {
                    if t.kind() == "type_identifier" || t.kind() == "identifier" {
                        implements.push(node_text(t, source).to_string());
                    }
                }
            }
            "identifier" | "member_expression" => {
                if extends.is_none() {
                    *extends = Some(node_text(clause, source).to_string());
                }
            }
            _ => {}
        }
    }
}

fn leading_doc_comment(node: Node, source: &str) -> Option<String> {
    let prev = node.prev_sibling()?;
    if prev.kind() != "comment" {
        return None;
    }
    let text = node_text(prev, source);
    if !text.starts_with("/**") {
        return None;
    }
    Some(
        text.trim_start_matches("/**")
            .trim_end_matches("*/")
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
    )
}

fn extract_import(node: Node, source: &str, result: &mut ParseResult) {
    let is_type_only = node
        .child(1)
        .map(|n| node_text(n, source) == "type")
        .unwrap_or(false);

    let source_node = node
        .children(&mut node.walk())
        .find(|c| c.kind() == "string")
        .map(|n| node_text(n, source).trim_matches(|c| c == '"' || c == '\'').to_string());
    let Some(source_str) = source_node else {
        return;
    };

    let mut names = Vec::new();
    let mut is_default = false;
    let mut is_namespace = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_clause" => {
                let mut c2 = child.walk();
                for part in child.children(&mut c2) {
                    match part.kind() {
                        "identifier" => {
                            is_default = true;
                            names.push(node_text(part, source).to_string());
                        }
                        "namespace_import" => {
                            is_namespace = true;
                            if let Some(id) = part.children(&mut part.walk()).find(|c| c.kind() == "identifier") {
                                names.push(node_text(id, source).to_string());
                            }
                        }
                        "named_imports" => {
                            let mut c3 = part.walk();
                            for spec in part.children(&mut c3) {
                                if spec.kind() == "import_specifier" {
                                    let alias = spec
                                        .child_by_field_name("alias")
                                        .or_else(|| spec.child_by_field_name("name"));
                                    if let Some(a) = alias {
                                        names.push(node_text(a, source).to_string());
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    result.imports.push(ImportRecord {
        source: source_str,
        names,
        is_default,
        is_namespace,
        is_type_only,
        is_dynamic: false,
    });
}

fn extract_export(
    node: Node,
    source: &str,
    depth: usize,
    is_typescript: bool,
    result: &mut ParseResult,
) {
    let is_default = node
        .children(&mut node.walk())
        .any(|c| c.kind() == "default");

    if let Some(source_node) = node.child_by_field_name("source") {
        // export { a, b } from "mod"; re-export.
        let src = node_text(source_node, source).trim_matches(|c| c == '"' || c == '\'').to_string();
        if let Some(clause) = node.children(&mut node.walk()).find(|c| c.kind() == "export_clause") {
            let mut c = clause.walk();
            for spec in clause.children(&mut c) {
                if spec.kind() == "export_specifier" {
                    let name_node = spec.child_by_field_name("alias").or_else(|| spec.child_by_field_name("name"));
                    if let Some(n) = name_node {
                        result.exports.push(ExportRecord {
                            name: node_text(n, source).to_string(),
                            is_default: false,
                            is_re_export: true,
                            source: Some(src.clone()),
                        });
                    }
                }
            }
        }
        return;
    }

    if let Some(decl) = node.child_by_field_name("declaration") {
        let before = result.symbols.len();
        process_decl(decl, source, depth + 1, is_typescript, result);
        for sym in &result.symbols[before..] {
            result.exports.push(ExportRecord {
                name: sym.name.clone(),
                is_default,
                is_re_export: false,
                source: None,
            });
        }
        return;
    }

    if let Some(value) = node.child_by_field_name("value") {
        result.exports.push(ExportRecord {
            name: node_text(value, source).to_string(),
            is_default,
            is_re_export: false,
            source: None,
        });
        return;
    }

    if let Some(clause) = node.children(&mut node.walk()).find(|c| c.kind() == "export_clause") {
        let mut c = clause.walk();
        for spec in clause.children(&mut c) {
            if spec.kind() == "export_specifier" {
                let name_node = spec.child_by_field_name("alias").or_else(|| spec.child_by_field_name("name"));
                if let Some(n) = name_node {
                    result.exports.push(ExportRecord {
                        name: node_text(n, source).to_string(),
                        is_default: false,
                        is_re_export: false,
                        source: None,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::dispatcher::parse_file;
    use crate::types::Language;

    #[test]
    fn default_import_sets_flag() {
        let result = parse_file("import React from \"react\";\n", "js", Language::JavaScript);
        assert_eq!(result.imports.len(), 1);
        assert!(result.imports[0].is_default);
        assert_eq!(result.imports[0].names, vec!["React".to_string()]);
    }

    #[test]
    fn namespace_import_sets_flag() {
        let result = parse_file("import * as utils from \"./utils\";\n", "js", Language::JavaScript);
        assert!(result.imports[0].is_namespace);
        assert_eq!(result.imports[0].names, vec!["utils".to_string()]);
    }

    #[test]
    fn two_file_scenario_a_exports_class() {
        let result = parse_file("export class A {}\n", "ts", Language::JavaScript);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "A");
    }

    #[test]
    fn class_extends_tracked() {
        let result = parse_file(
            "import {A} from \"./a\";\nexport class B extends A {}\n",
            "ts",
            Language::JavaScript,
        );
        let b = result.symbols.iter().find(|s| s.name == "B").unwrap();
        assert_eq!(b.extends.as_deref(), Some("A"));
    }
}
