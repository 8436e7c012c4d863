//! C extractor. `#include` directives become imports; functions, structs,
//! enums, unions and typedefs without a leading underscore and without a
//! `static` storage-class specifier are exported (spec.md §4.4 default
//! rule — C has no explicit export keyword; `static` is the natural
//! analogue of internal linkage, so it is treated as non-exported).

use super::{
    check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult,
    SymbolRecord,
};
use crate::types::SymbolKind;
use tree_sitter::Node;

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = ParseResult::default();
    walk(root, source, 0, &mut result);
    result
}

fn is_static(node: Node, source: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.kind() == "storage_class_specifier" && node_text(c, source) == "static")
}

fn declarator_name<'a>(mut node: Node<'a>, source: &'a str) -> Option<&'a str> {
    loop {
        match node.kind() {
            "identifier" | "field_identifier" => return Some(node_text(node, source)),
            "function_declarator" | "pointer_declarator" | "array_declarator" | "init_declarator" => {
                node = node.child_by_field_name("declarator")?;
            }
            _ => return None,
        }
    }
}

fn push_decl(name: &str, kind: SymbolKind, node: Node, source: &str, exported: bool, result: &mut ParseResult) {
    if name.is_empty() {
        return;
    }
    result.symbols.push(SymbolRecord {
        kind,
        name: name.to_string(),
        signature: Some(
            node_text(node, source)
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        ),
        range: node_range(node),
        extends: None,
        implements: Vec::new(),
        doc_comment: None,
    });
    if exported && !name.starts_with('_') {
        result.exports.push(ExportRecord {
            name: name.to_string(),
            is_default: false,
            is_re_export: false,
            source: None,
        });
    }
}

fn walk(node: Node, source: &str, depth: usize, result: &mut ParseResult) {
    if !check_recursion_depth(depth, &mut result.diagnostics) {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                let Some(declarator) = child.child_by_field_name("declarator") else {
                    continue;
                };
                if let Some(name) = declarator_name(declarator, source) {
                    push_decl(name, SymbolKind::Function, child, source, !is_static(child, source), result);
                }
            }
            "declaration" => {
                let exported = !is_static(child, source);
                let mut c2 = child.walk();
                for decl in child.children(&mut c2) {
                    if matches!(decl.kind(), "function_declarator" | "identifier" | "pointer_declarator" | "array_declarator" | "init_declarator") {
                        if let Some(name) = declarator_name(decl, source) {
                            let kind = if decl.kind() == "function_declarator" {
                                SymbolKind::Function
                            } else {
                                SymbolKind::Variable
                            };
                            push_decl(name, kind, child, source, exported, result);
                        }
                    }
                }
            }
            "struct_specifier" | "union_specifier" | "enum_specifier" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let kind = if child.kind() == "enum_specifier" {
                    SymbolKind::Enum
                } else {
                    SymbolKind::Class
                };
                push_decl(node_text(name_node, source), kind, child, source, true, result);
            }
            "type_definition" => {
                if let Some(declarator) = child.child_by_field_name("declarator") {
                    if let Some(name) = declarator_name(declarator, source) {
                        push_decl(name, SymbolKind::Type, child, source, true, result);
                    }
                }
            }
            "preproc_include" => extract_include(child, source, result),
            "translation_unit" | "preproc_ifdef" | "linkage_specification" | "declaration_list" => {
                walk(child, source, depth + 1, result);
            }
            _ => {}
        }
    }
}

fn extract_include(node: Node, source: &str, result: &mut ParseResult) {
    let Some(path_node) = node.child_by_field_name("path") else {
        return;
    };
    let raw = node_text(path_node, source);
    let is_system = path_node.kind() == "system_lib_string";
    let path = raw.trim_matches('"').trim_start_matches('<').trim_end_matches('>');
    result.imports.push(ImportRecord {
        source: path.to_string(),
        names: Vec::new(),
        is_default: true,
        is_namespace: is_system,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::dispatcher::parse_file;
    use crate::types::Language;

    #[test]
    fn function_and_include_extracted() {
        let src = "#include <stdio.h>\nint add(int a, int b) { return a + b; }\n";
        let result = parse_file(src, "c", Language::C);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "stdio.h");
        assert!(result.symbols.iter().any(|s| s.name == "add"));
        assert!(result.exports.iter().any(|e| e.name == "add"));
    }

    #[test]
    fn static_function_not_exported() {
        let result = parse_file("static int helper(void) { return 0; }\n", "c", Language::C);
        assert!(result.symbols.iter().any(|s| s.name == "helper"));
        assert!(result.exports.is_empty());
    }

    #[test]
    fn struct_extracted() {
        let result = parse_file("struct Point { int x; int y; };\n", "c", Language::C);
        assert!(result.symbols.iter().any(|s| s.name == "Point" && s.kind == SymbolKind::Class));
    }
}
