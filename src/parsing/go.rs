//! Go extractor. Export rule follows Go's own convention (capitalized
//! identifier), the natural analogue of the underscore-prefix rule used by
//! other languages in spec.md §4.4.

use super::{check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult, SymbolRecord};
use crate::types::SymbolKind;
use tree_sitter::Node;

fn is_exported_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = ParseResult::default();
    walk(root, source, 0, &mut result);
    result
}

fn push_symbol_and_export(name: String, kind: SymbolKind, node: Node, source: &str, result: &mut ParseResult) {
    let exported = is_exported_name(&name);
    result.symbols.push(SymbolRecord {
        kind,
        name: name.clone(),
        signature: Some(node_text(node, source).lines().next().unwrap_or_default().trim().to_string()),
        range: node_range(node),
        extends: None,
        implements: Vec::new(),
        doc_comment: None,
    });
    if exported {
        result.exports.push(ExportRecord {
            name,
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
            "function_declaration" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    push_symbol_and_export(
                        node_text(name_node, source).to_string(),
                        SymbolKind::Function,
                        child,
                        source,
                        result,
                    );
                }
            }
            "method_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let receiver_type = child
                    .child_by_field_name("receiver")
                    .and_then(|r| receiver_type_name(r, source));
                let name = node_text(name_node, source);
                let full_name = match &receiver_type {
                    Some(ty) => format!("{ty}.{name}"),
                    None => name.to_string(),
                };
                let exported = is_exported_name(name);
                result.symbols.push(SymbolRecord {
                    kind: SymbolKind::Method,
                    name: full_name.clone(),
                    signature: Some(node_text(child, source).lines().next().unwrap_or_default().trim().to_string()),
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: None,
                });
                if exported && receiver_type.is_none() {
                    result.exports.push(ExportRecord {
                        name: full_name,
                        is_default: false,
                        is_re_export: false,
                        source: None,
                    });
                }
            }
            "type_declaration" => {
                let mut c2 = child.walk();
                for spec in child.children(&mut c2) {
                    if spec.kind() == "type_spec" {
                        if let Some(name_node) = spec.child_by_field_name("name") {
                            let ty = spec.child_by_field_name("type");
                            let kind = match ty.map(|n| n.kind()) {
                                Some("interface_type") => SymbolKind::Interface,
                                Some("struct_type") => SymbolKind::Class,
                                _ => SymbolKind::Type,
                            };
                            push_symbol_and_export(
                                node_text(name_node, source).to_string(),
                                kind,
                                spec,
                                source,
                                result,
                            );
                        }
                    }
                }
            }
            "const_declaration" | "var_declaration" => {
                let mut c2 = child.walk();
                for spec in child.children(&mut c2) {
                    if matches!(spec.kind(), "const_spec" | "var_spec") {
                        if let Some(name_node) = spec.child_by_field_name("name") {
                            push_symbol_and_export(
                                node_text(name_node, source).to_string(),
                                SymbolKind::Variable,
                                spec,
                                source,
                                result,
                            );
                        }
                    }
                }
            }
            "import_declaration" => extract_import_decl(child, source, result),
            "source_file" => walk(child, source, depth + 1, result),
            _ => {}
        }
    }
}

fn receiver_type_name(receiver: Node, source: &str) -> Option<String> {
    let mut cursor = receiver.walk();
    for param in receiver.children(&mut cursor) {
        if param.kind() == "parameter_declaration" {
            if let Some(ty) = param.child_by_field_name("type") {
                let text = node_text(ty, source).trim_start_matches('*');
                return Some(text.to_string());
            }
        }
    }
    None
}

fn extract_import_decl(node: Node, source: &str, result: &mut ParseResult) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_spec" => extract_import_spec(child, source, result),
            "import_spec_list" => {
                let mut c2 = child.walk();
                for spec in child.children(&mut c2) {
                    if spec.kind() == "import_spec" {
                        extract_import_spec(spec, source, result);
                    }
                }
            }
            _ => {}
        }
    }
}

fn extract_import_spec(node: Node, source: &str, result: &mut ParseResult) {
    let Some(path_node) = node.child_by_field_name("path") else {
        return;
    };
    let path = node_text(path_node, source)
        .trim_matches('"')
        .to_string();
    let pkg_name = path.rsplit('/').next().unwrap_or(&path).to_string();

    let mut is_namespace = false;
    let names = if let Some(alias) = node.child_by_field_name("name") {
        let alias_text = node_text(alias, source);
        if alias_text == "." {
            is_namespace = true;
            Vec::new()
        } else if alias_text == "_" {
            Vec::new()
        } else {
            vec![alias_text.to_string()]
        }
    } else {
        vec![pkg_name]
    };

    result.imports.push(ImportRecord {
        source: path,
        names,
        is_default: true,
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
    fn exported_function_detected() {
        let result = parse_file("package main\n\nfunc DoWork() {}\nfunc helper() {}\n", "go", Language::Go);
        assert_eq!(result.symbols.len(), 2);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "DoWork");
    }

    #[test]
    fn method_receiver_becomes_prefix() {
        let src = "package main\n\ntype T struct{}\nfunc (t T) Run() {}\n";
        let result = parse_file(src, "go", Language::Go);
        assert!(result.symbols.iter().any(|s| s.name == "T.Run"));
    }

    #[test]
    fn import_extracted() {
        let result = parse_file("package main\n\nimport \"fmt\"\n", "go", Language::Go);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "fmt");
    }
}
