//! TypeScript extractor: reuses the JavaScript walk for functions/classes/
//! imports/exports (same grammar family) and adds `interface`/`type` alias
//! declarations, which have no JavaScript counterpart.

use super::{check_recursion_depth, node_range, node_text, javascript, ExportRecord, ParseResult, SymbolRecord};
use crate::types::SymbolKind;
use tree_sitter::Node;

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = javascript::extract(root, source, true);
    walk_ts_only(root, source, 0, &mut result);
    result
}

fn walk_ts_only(node: Node, source: &str, depth: usize, result: &mut ParseResult) {
    if !check_recursion_depth(depth, &mut result.diagnostics) {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "export_statement" => {
                // The declaration field already *is* the interface/type node,
                // not a wrapper containing it, so dispatch on it directly.
                if let Some(decl) = child.child_by_field_name("declaration") {
                    process_ts_decl(decl, source, result);
                }
            }
            "program" | "statement_block" | "class_body" => {
                walk_ts_only(child, source, depth + 1, result);
            }
            _ => process_ts_decl(child, source, result),
        }
    }
}

/// Dispatches on an interface/type-alias node's own kind — shared by the
/// `walk_ts_only` loop (called on each child) and the `export_statement`
/// branch (called directly on the `declaration` field).
fn process_ts_decl(node: Node, source: &str, result: &mut ParseResult) {
    match node.kind() {
        "interface_declaration" => {
            let Some(name_node) = node.child_by_field_name("name") else {
                return;
            };
            let name = node_text(name_node, source).to_string();
            let mut implements = Vec::new();
            if let Some(heritage) = node
                .children(&mut node.walk())
                .find(|c| c.kind() == "extends_type_clause")
            {
                let mut c2 = heritage.walk();
                for t in heritage.children(&mut c2) {
                    if t.kind() == "type_identifier" {
                        implements.push(node_text(t, source).to_string());
                    }
                }
            }
            result.symbols.push(SymbolRecord {
                kind: SymbolKind::Interface,
                name: name.clone(),
                signature: None,
                range: node_range(node),
                extends: implements.first().cloned(),
                implements: implements.into_iter().skip(1).collect(),
                doc_comment: None,
            });
            if is_exported(node) {
                result.exports.push(ExportRecord {
                    name,
                    is_default: false,
                    is_re_export: false,
                    source: None,
                });
            }
        }
        "type_alias_declaration" => {
            let Some(name_node) = node.child_by_field_name("name") else {
                return;
            };
            let name = node_text(name_node, source).to_string();
            result.symbols.push(SymbolRecord {
                kind: SymbolKind::Type,
                name: name.clone(),
                signature: None,
                range: node_range(node),
                extends: None,
                implements: Vec::new(),
                doc_comment: None,
            });
            if is_exported(node) {
                result.exports.push(ExportRecord {
                    name,
                    is_default: false,
                    is_re_export: false,
                    source: None,
                });
            }
        }
        _ => {}
    }
}

fn is_exported(node: Node) -> bool {
    node.parent()
        .map(|p| p.kind() == "export_statement")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::dispatcher::parse_file;
    use crate::types::Language;

    #[test]
    fn interface_extends_tracked() {
        let src = "export interface Base {}\nexport interface Derived extends Base {}\n";
        let result = parse_file(src, "ts", Language::TypeScript);
        let derived = result.symbols.iter().find(|s| s.name == "Derived").unwrap();
        assert_eq!(derived.extends.as_deref(), Some("Base"));
        assert_eq!(derived.kind, SymbolKind::Interface);
    }

    #[test]
    fn type_alias_is_type_kind() {
        let result = parse_file("type Id = string;\n", "ts", Language::TypeScript);
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].kind, SymbolKind::Type);
    }

    #[test]
    fn import_type_sets_flag() {
        let result = parse_file("import type { Foo } from \"./foo\";\n", "ts", Language::TypeScript);
        assert!(result.imports[0].is_type_only);
    }
}
