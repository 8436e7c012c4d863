//! Rust extractor. `pub` items are exported; `use` declarations become
//! imports; `impl` blocks contribute methods named `<Type>.<method>`.

use super::{check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult, SymbolRecord};
use crate::types::SymbolKind;
use tree_sitter::Node;

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = ParseResult::default();
    walk_item(root, source, 0, None, &mut result);
    result
}

fn is_pub(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier")
}

fn field_text<'a>(node: Node, field: &str, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| node_text(n, source))
}

fn signature_line(node: Node, source: &str) -> String {
    let text = node_text(node, source);
    text.lines().next().unwrap_or(text).trim().to_string()
}

fn walk_item(
    node: Node,
    source: &str,
    depth: usize,
    enclosing_type: Option<&str>,
    result: &mut ParseResult,
) {
    if !check_recursion_depth(depth, &mut result.diagnostics) {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_item" => {
                let Some(name) = field_text(child, "name", source) else {
                    continue;
                };
                let (kind, full_name) = match enclosing_type {
                    Some(ty) => (SymbolKind::Method, format!("{ty}.{name}")),
                    None => (SymbolKind::Function, name.to_string()),
                };
                let exported = is_pub(child);
                result.symbols.push(SymbolRecord {
                    kind,
                    name: full_name.clone(),
                    signature: Some(signature_line(child, source)),
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: leading_doc_comment(child, source),
                });
                if exported && enclosing_type.is_none() {
                    result.exports.push(ExportRecord {
                        name: full_name,
                        is_default: false,
                        is_re_export: false,
                        source: None,
                    });
                }
            }
            "struct_item" | "enum_item" | "trait_item" | "type_item" => {
                let Some(name) = field_text(child, "name", source) else {
                    continue;
                };
                let kind = match child.kind() {
                    "struct_item" => SymbolKind::Class,
                    "enum_item" => SymbolKind::Enum,
                    "trait_item" => SymbolKind::Interface,
                    _ => SymbolKind::Type,
                };
                result.symbols.push(SymbolRecord {
                    kind,
                    name: name.to_string(),
                    signature: Some(signature_line(child, source)),
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: leading_doc_comment(child, source),
                });
                if is_pub(child) {
                    result.exports.push(ExportRecord {
                        name: name.to_string(),
                        is_default: false,
                        is_re_export: false,
                        source: None,
                    });
                }
            }
            "const_item" | "static_item" => {
                let Some(name) = field_text(child, "name", source) else {
                    continue;
                };
                result.symbols.push(SymbolRecord {
                    kind: SymbolKind::Variable,
                    name: name.to_string(),
                    signature: Some(signature_line(child, source)),
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: None,
                });
                if is_pub(child) {
                    result.exports.push(ExportRecord {
                        name: name.to_string(),
                        is_default: false,
                        is_re_export: false,
                        source: None,
                    });
                }
            }
            "mod_item" => {
                if let Some(body) = child.child_by_field_name("body") {
                    walk_item(body, source, depth + 1, enclosing_type, result);
                }
            }
            "impl_item" => {
                let ty_name = child
                    .child_by_field_name("type")
                    .map(|n| node_text(n, source).to_string());
                let trait_name = child
                    .child_by_field_name("trait")
                    .map(|n| node_text(n, source).to_string());

                if let (Some(ty), Some(trait_name)) = (&ty_name, &trait_name) {
                    if let Some(sym) = result.symbols.iter_mut().find(|s| &s.name == ty) {
                        if sym.extends.is_none() {
                            sym.extends = Some(trait_name.clone());
                        } else {
                            sym.implements.push(trait_name.clone());
                        }
                    }
                }

                if let Some(body) = child.child_by_field_name("body") {
                    walk_item(body, source, depth + 1, ty_name.as_deref(), result);
                }
            }
            "use_declaration" => {
                if let Some(arg) = child.child_by_field_name("argument") {
                    extract_use_tree(arg, source, result);
                }
            }
            "declaration_list" | "source_file" => {
                walk_item(child, source, depth + 1, enclosing_type, result);
            }
            _ => {}
        }
    }
}

fn leading_doc_comment(node: Node, source: &str) -> Option<String> {
    let mut sibling = node.prev_sibling();
    let mut lines = Vec::new();
    while let Some(s) = sibling {
        if s.kind() == "line_comment" {
            let text = node_text(s, source);
            if let Some(stripped) = text.strip_prefix("///") {
                lines.push(stripped.trim().to_string());
                sibling = s.prev_sibling();
                continue;
            }
        }
        break;
    }
    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

fn extract_use_tree(node: Node, source: &str, result: &mut ParseResult) {
    match node.kind() {
        "use_as_clause" => {
            let path = node
                .child_by_field_name("path")
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_default();
            let alias = node
                .child_by_field_name("alias")
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_default();
            result.imports.push(ImportRecord {
                source: path,
                names: vec![alias],
                is_default: true,
                ..Default::default()
            });
        }
        "use_list" => {
            let mut cursor = node.walk();
            for c in node.children(&mut cursor) {
                if c.kind() != "," && c.kind() != "{" && c.kind() != "}" {
                    extract_use_tree(c, source, result);
                }
            }
        }
        "scoped_use_list" => {
            let prefix = node
                .child_by_field_name("path")
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_default();
            if let Some(list) = node.child_by_field_name("list") {
                let mut cursor = list.walk();
                for c in list.children(&mut cursor) {
                    if matches!(c.kind(), "identifier" | "scoped_identifier" | "self") {
                        let name = node_text(c, source);
                        result.imports.push(ImportRecord {
                            source: format!("{prefix}::{name}"),
                            names: vec![name.to_string()],
                            is_default: true,
                            ..Default::default()
                        });
                    }
                }
            }
        }
        "use_wildcard" => {
            let path = node
                .child(0)
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_default();
            result.imports.push(ImportRecord {
                source: path,
                names: Vec::new(),
                is_namespace: true,
                ..Default::default()
            });
        }
        "scoped_identifier" | "identifier" => {
            let full = node_text(node, source);
            let name = full.rsplit("::").next().unwrap_or(full);
            result.imports.push(ImportRecord {
                source: full.to_string(),
                names: vec![name.to_string()],
                is_default: true,
                ..Default::default()
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::dispatcher::parse_file;
    use crate::types::Language;

    #[test]
    fn extracts_function_and_use() {
        let src = "use std::collections::HashMap;\npub fn add(a: i32, b: i32) -> i32 { a + b }\n";
        let result = parse_file(src, "rs", Language::Rust);
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].name, "add");
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "std::collections::HashMap");
    }

    #[test]
    fn impl_trait_sets_extends() {
        let src = "struct Foo;\ntrait Bar {}\nimpl Bar for Foo { fn m(&self) {} }\n";
        let result = parse_file(src, "rs", Language::Rust);
        let foo = result.symbols.iter().find(|s| s.name == "Foo").unwrap();
        assert_eq!(foo.extends.as_deref(), Some("Bar"));
        assert!(result.symbols.iter().any(|s| s.name == "Foo.m"));
    }

    #[test]
    fn round_trip_class_with_three_methods() {
        let src = "pub struct C;\nimpl C {\n    pub fn m1(&self) {}\n    pub fn m2(&self) {}\n    pub fn m3(&self) {}\n}\n";
        let result = parse_file(src, "rs", Language::Rust);
        let names: Vec<_> = result.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"C"));
        assert!(names.contains(&"C.m1"));
        assert!(names.contains(&"C.m2"));
        assert!(names.contains(&"C.m3"));
    }
}
