//! Java extractor. `public` members are exported; `import` declarations
//! (including static and wildcard imports) become import records.

use super::{check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult, SymbolRecord};
use crate::types::SymbolKind;
use tree_sitter::Node;

fn has_modifier(node: Node, source: &str, modifier: &str) -> bool {
    node.child_by_field_name("modifiers")
        .map(|m| node_text(m, source).split_whitespace().any(|w| w == modifier))
        .unwrap_or(false)
}

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = ParseResult::default();
    walk(root, source, 0, None, &mut result);
    result
}

fn walk(node: Node, source: &str, depth: usize, enclosing: Option<&str>, result: &mut ParseResult) {
    if !check_recursion_depth(depth, &mut result.diagnostics) {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "interface_declaration" | "enum_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source).to_string();
                let kind = match child.kind() {
                    "interface_declaration" => SymbolKind::Interface,
                    "enum_declaration" => SymbolKind::Enum,
                    _ => SymbolKind::Class,
                };

                let mut extends = None;
                let mut implements = Vec::new();
                if let Some(sup) = child.child_by_field_name("superclass") {
                    extends = Some(node_text(sup, source).trim_start_matches("extends").trim().to_string());
                }
                if let Some(ifaces) = child.child_by_field_name("interfaces") {
                    let mut c2 = ifaces.walk();
                    for t in ifaces.children(&mut c2) {
                        if t.kind() == "type_list" {
                            let mut c3 = t.walk();
                            for ty in t.children(&mut c3) {
                                if ty.kind() != "," {
                                    implements.push(node_text(ty, source).to_string());
                                }
                            }
                        }
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
                if has_modifier(child, source, "public") {
                    result.exports.push(ExportRecord {
                        name: name.clone(),
                        is_default: false,
                        is_re_export: false,
                        source: None,
                    });
                }

                if let Some(body) = child.child_by_field_name("body") {
                    walk(body, source, depth + 1, Some(&name), result);
                }
            }
            "method_declaration" | "constructor_declaration" => {
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
            "field_declaration" => {
                let mut c2 = child.walk();
                for declarator in child.children(&mut c2) {
                    if declarator.kind() == "variable_declarator" {
                        if let Some(name_node) = declarator.child_by_field_name("name") {
                            result.symbols.push(SymbolRecord {
                                kind: SymbolKind::Property,
                                name: node_text(name_node, source).to_string(),
                                signature: None,
                                range: node_range(child),
                                extends: None,
                                implements: Vec::new(),
                                doc_comment: None,
                            });
                        }
                    }
                }
            }
            "import_declaration" => extract_import(child, source, result),
            "program" | "class_body" | "interface_body" => {
                walk(child, source, depth + 1, enclosing, result);
            }
            _ => {}
        }
    }
}

fn extract_import(node: Node, source: &str, result: &mut ParseResult) {
    let text = node_text(node, source);
    let is_static = text.contains("static");
    let body = text
        .trim_start_matches("import")
        .trim_start_matches("static")
        .trim()
        .trim_end_matches(';')
        .trim();
    let is_namespace = body.ends_with(".*");
    let path = body.trim_end_matches(".*").to_string();
    let name = path.rsplit('.').next().unwrap_or(&path).to_string();

    result.imports.push(ImportRecord {
        source: path,
        names: if is_namespace { Vec::new() } else { vec![name] },
        is_default: !is_namespace,
        is_namespace,
        is_type_only: is_static,
        is_dynamic: false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::dispatcher::parse_file;
    use crate::types::Language;

    #[test]
    fn public_class_is_exported() {
        let result = parse_file("public class Foo {}\nclass Bar {}\n", "java", Language::Java);
        assert_eq!(result.symbols.len(), 2);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "Foo");
    }

    #[test]
    fn implements_and_extends_tracked() {
        let src = "public class Foo extends Base implements A, B {}\n";
        let result = parse_file(src, "java", Language::Java);
        let foo = &result.symbols[0];
        assert_eq!(foo.extends.as_deref(), Some("Base"));
        assert_eq!(foo.implements, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn import_extracted() {
        let result = parse_file("import java.util.List;\n", "java", Language::Java);
        assert_eq!(result.imports[0].source, "java.util.List");
        assert_eq!(result.imports[0].names, vec!["List".to_string()]);
    }
}
