//! PHP extractor. `use` (namespace import) declarations become imports;
//! functions/classes/interfaces without a leading underscore are exported
//! (spec.md §4.4 default rule — PHP has no explicit export keyword).

use super::{check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult, SymbolRecord};
use crate::types::SymbolKind;
use tree_sitter::Node;

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = ParseResult::default();
    walk(root, source, 0, None, &mut result);
    apply_default_exports(&mut result);
    result
}

fn apply_default_exports(result: &mut ParseResult) {
    result.exports = result
        .symbols
        .iter()
        .filter(|s| !s.name.contains('.'))
        .filter(|s| !s.name.starts_with('_'))
        .map(|s| ExportRecord {
            name: s.name.clone(),
            is_default: false,
            is_re_export: false,
            source: None,
        })
        .collect();
}

fn walk(node: Node, source: &str, depth: usize, enclosing: Option<&str>, result: &mut ParseResult) {
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
                result.symbols.push(SymbolRecord {
                    kind: SymbolKind::Function,
                    name: node_text(name_node, source).to_string(),
                    signature: None,
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: None,
                });
            }
            "class_declaration" | "interface_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source).to_string();
                let kind = if child.kind() == "interface_declaration" {
                    SymbolKind::Interface
                } else {
                    SymbolKind::Class
                };

                let mut extends = None;
                let mut implements = Vec::new();
                let mut c2 = child.walk();
                for part in child.children(&mut c2) {
                    match part.kind() {
                        "base_clause" => {
                            if let Some(n) = part.child(1) {
                                extends = Some(node_text(n, source).to_string());
                            }
                        }
                        "class_interface_clause" => {
                            let mut c3 = part.walk();
                            for t in part.children(&mut c3) {
                                if t.kind() == "name" || t.kind() == "qualified_name" {
                                    implements.push(node_text(t, source).to_string());
                                }
                            }
                        }
                        _ => {}
                    }
                }

                result.symbols.push(SymbolRecord {
                    kind,
                    name: name.clone(),
                    signature: None,
                    range: node_range(child),
                    extends,
                    implements,
                    doc_comment: None,
                });

                if let Some(body) = child.child_by_field_name("body") {
                    walk(body, source, depth + 1, Some(&name), result);
                }
            }
            "method_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source);
                let full_name = match enclosing {
                    Some(c) => format!("{c}.{name}"),
                    None => name.to_string(),
                };
                result.symbols.push(SymbolRecord {
                    kind: SymbolKind::Method,
                    name: full_name,
                    signature: None,
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: None,
                });
            }
            "namespace_use_declaration" => extract_use(child, source, result),
            "program" | "declaration_list" | "compound_statement" => {
                walk(child, source, depth + 1, enclosing, result);
            }
            _ => {}
        }
    }
}

fn extract_use(node: Node, source: &str, result: &mut ParseResult) {
    let mut cursor = node.walk();
    for clause in node.children(&mut cursor) {
        if clause.kind() == "namespace_use_clause" {
            let Some(name_node) = clause.child_by_field_name("name") else {
                continue;
            };
            let full = node_text(name_node, source).to_string();
            let alias = clause
                .child_by_field_name("alias")
                .map(|a| node_text(a, source).to_string())
                .unwrap_or_else(|| full.rsplit('\\').next().unwrap_or(&full).to_string());
            result.imports.push(ImportRecord {
                source: full,
                names: vec![alias],
                is_default: true,
                ..Default::default()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::dispatcher::parse_file;
    use crate::types::Language;

    #[test]
    fn class_extends_and_implements() {
        let src = "<?php\nclass Foo extends Base implements A, B {}\n";
        let result = parse_file(src, "php", Language::Php);
        let foo = result.symbols.iter().find(|s| s.name == "Foo").unwrap();
        assert_eq!(foo.extends.as_deref(), Some("Base"));
        assert!(foo.implements.contains(&"A".to_string()));
    }

    #[test]
    fn use_declaration_imported() {
        let src = "<?php\nuse App\\Models\\User;\n";
        let result = parse_file(src, "php", Language::Php);
        assert_eq!(result.imports[0].source, "App\\Models\\User");
        assert_eq!(result.imports[0].names, vec!["User".to_string()]);
    }
}
