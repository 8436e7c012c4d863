//! C# extractor. `public` members are exported, mirroring the Java
//! extractor's modifier check; `using` directives become imports.

use super::{
    check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult,
    SymbolRecord,
};
use crate::types::SymbolKind;
use tree_sitter::Node;

fn has_public_modifier(node: Node, source: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| {
        c.kind() == "modifier" && node_text(c, source).trim() == "public"
    })
}

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = ParseResult::default();
    walk(root, source, 0, None, &mut result);
    result
}

fn base_list(node: Node, source: &str) -> (Option<String>, Vec<String>) {
    let Some(list) = node.child_by_field_name("bases") else {
        return (None, Vec::new());
    };
    let mut names = Vec::new();
    let mut cursor = list.walk();
    for c in list.children(&mut cursor) {
        if matches!(c.kind(), "identifier" | "generic_name" | "qualified_name") {
            names.push(node_text(c, source).to_string());
        }
    }
    let mut iter = names.into_iter();
    (iter.next(), iter.collect())
}

fn walk(node: Node, source: &str, depth: usize, enclosing: Option<&str>, result: &mut ParseResult) {
    if !check_recursion_depth(depth, &mut result.diagnostics) {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "interface_declaration" | "struct_declaration" | "enum_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source).to_string();
                let kind = match child.kind() {
                    "interface_declaration" => SymbolKind::Interface,
                    "enum_declaration" => SymbolKind::Enum,
                    _ => SymbolKind::Class,
                };
                let (extends, implements) = base_list(child, source);

                result.symbols.push(SymbolRecord {
                    kind,
                    name: name.clone(),
                    signature: None,
                    range: node_range(child),
                    extends,
                    implements,
                    doc_comment: None,
                });
                if has_public_modifier(child, source) {
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
            "property_declaration" | "field_declaration" => {
                let mut c2 = child.walk();
                for declarator in child.children(&mut c2) {
                    if matches!(declarator.kind(), "variable_declarator") {
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
                if child.kind() == "property_declaration" {
                    if let Some(name_node) = child.child_by_field_name("name") {
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
            "namespace_declaration" | "file_scoped_namespace_declaration" | "compilation_unit"
            | "declaration_list" => {
                walk(child, source, depth + 1, enclosing, result);
            }
            "using_directive" => extract_using(child, source, result),
            _ => {}
        }
    }
}

fn extract_using(node: Node, source: &str, result: &mut ParseResult) {
    let Some(name_node) = child_name_or_qualified(node) else {
        return;
    };
    let path = node_text(name_node, source).to_string();
    let name = path.rsplit('.').next().unwrap_or(&path).to_string();
    let is_static = node_text(node, source).contains("static");
    result.imports.push(ImportRecord {
        source: path,
        names: vec![name],
        is_default: true,
        is_type_only: is_static,
        ..Default::default()
    });
}

fn child_name_or_qualified(node: Node) -> Option<Node> {
    node.child_by_field_name("name")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::dispatcher::parse_file;
    use crate::types::Language;

    #[test]
    fn public_class_exported() {
        let result = parse_file(
            "public class Foo {}\nclass Bar {}\n",
            "cs",
            Language::CSharp,
        );
        assert_eq!(result.symbols.len(), 2);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "Foo");
    }

    #[test]
    fn base_list_tracked() {
        let result = parse_file(
            "public class Foo : Base, IA, IB {}\n",
            "cs",
            Language::CSharp,
        );
        let foo = &result.symbols[0];
        assert_eq!(foo.extends.as_deref(), Some("Base"));
        assert_eq!(foo.implements, vec!["IA".to_string(), "IB".to_string()]);
    }

    #[test]
    fn using_extracted() {
        let result = parse_file("using System.Collections.Generic;\n", "cs", Language::CSharp);
        assert_eq!(result.imports[0].source, "System.Collections.Generic");
        assert_eq!(result.imports[0].names, vec!["Generic".to_string()]);
    }
}
