//! C++ extractor. Builds on the C grammar with `class_specifier`,
//! `namespace_definition`, `using_declaration` and template wrappers.
//! Export rule follows C's (no leading underscore, no `static`); classes
//! additionally populate `extends`/`implements` from their base-class list.

use super::{
    check_recursion_depth, node_range, node_text, ExportRecord, ImportRecord, ParseResult,
    SymbolRecord,
};
use crate::types::SymbolKind;
use tree_sitter::Node;

pub fn extract(root: Node, source: &str) -> ParseResult {
    let mut result = ParseResult::default();
    walk(root, source, 0, None, &mut result);
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
            "identifier" | "field_identifier" | "qualified_identifier" | "destructor_name" => {
                return Some(node_text(node, source));
            }
            "function_declarator" | "pointer_declarator" | "reference_declarator" | "array_declarator"
            | "init_declarator" => {
                node = node.child_by_field_name("declarator")?;
            }
            _ => return None,
        }
    }
}

fn push_symbol(
    name: &str,
    kind: SymbolKind,
    node: Node,
    source: &str,
    exported: bool,
    extends: Option<String>,
    implements: Vec<String>,
    result: &mut ParseResult,
) {
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
        extends,
        implements,
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

fn base_classes(child: Node, source: &str) -> (Option<String>, Vec<String>) {
    let Some(clause) = child.child_by_field_name("base_class_clause") else {
        return (None, Vec::new());
    };
    let mut names = Vec::new();
    let mut cursor = clause.walk();
    for base in clause.children(&mut cursor) {
        if base.kind() == "base_class_clause" || base.kind() == ":" || base.kind() == "," {
            continue;
        }
        // Strip access specifiers like `public Base`.
        let text = node_text(base, source);
        let name = text
            .trim_start_matches("public")
            .trim_start_matches("private")
            .trim_start_matches("protected")
            .trim()
            .to_string();
        if !name.is_empty() {
            names.push(name);
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
            "class_specifier" | "struct_specifier" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source).to_string();
                let (extends, implements) = base_classes(child, source);
                push_symbol(&name, SymbolKind::Class, child, source, true, extends, implements, result);
                if let Some(body) = child.child_by_field_name("body") {
                    walk(body, source, depth + 1, Some(&name), result);
                }
            }
            "enum_specifier" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    push_symbol(
                        node_text(name_node, source),
                        SymbolKind::Enum,
                        child,
                        source,
                        true,
                        None,
                        Vec::new(),
                        result,
                    );
                }
            }
            "namespace_definition" => {
                let ns_name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string());
                let full = match (enclosing, &ns_name) {
                    (Some(e), Some(n)) => Some(format!("{e}::{n}")),
                    (None, Some(n)) => Some(n.clone()),
                    _ => enclosing.map(String::from),
                };
                if let Some(body) = child.child_by_field_name("body") {
                    walk(body, source, depth + 1, full.as_deref(), result);
                }
            }
            "function_definition" => {
                let Some(declarator) = child.child_by_field_name("declarator") else {
                    continue;
                };
                if let Some(name) = declarator_name(declarator, source) {
                    let full_name = match enclosing {
                        Some(c) if !name.contains("::") => format!("{c}.{name}"),
                        _ => name.to_string(),
                    };
                    let kind = if enclosing.is_some() { SymbolKind::Method } else { SymbolKind::Function };
                    push_symbol(
                        &full_name,
                        kind,
                        child,
                        source,
                        !is_static(child, source) && enclosing.is_none(),
                        None,
                        Vec::new(),
                        result,
                    );
                }
            }
            "field_declaration" => {
                let mut c2 = child.walk();
                for decl in child.children(&mut c2) {
                    if matches!(decl.kind(), "function_declarator" | "field_identifier" | "pointer_declarator") {
                        if let Some(name) = declarator_name(decl, source) {
                            let full_name = match enclosing {
                                Some(c) => format!("{c}.{name}"),
                                None => name.to_string(),
                            };
                            let kind = if decl.kind() == "function_declarator" {
                                SymbolKind::Method
                            } else {
                                SymbolKind::Property
                            };
                            push_symbol(&full_name, kind, child, source, false, None, Vec::new(), result);
                        }
                    }
                }
            }
            "using_declaration" => {
                if let Some(arg) = child.child_by_field_name("name").or_else(|| child.child(1)) {
                    let path = node_text(arg, source).to_string();
                    let name = path.rsplit("::").next().unwrap_or(&path).to_string();
                    result.imports.push(ImportRecord {
                        source: path,
                        names: vec![name],
                        is_default: true,
                        ..Default::default()
                    });
                }
            }
            "preproc_include" => super_include(child, source, result),
            "template_declaration" => {
                walk(child, source, depth + 1, enclosing, result);
            }
            "translation_unit" | "declaration_list" | "field_declaration_list" | "linkage_specification" => {
                walk(child, source, depth + 1, enclosing, result);
            }
            _ => {}
        }
    }
}

fn super_include(node: Node, source: &str, result: &mut ParseResult) {
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
    fn class_with_base_tracked() {
        let src = "class Base {};\nclass Derived : public Base {\npublic:\n  void run();\n};\n";
        let result = parse_file(src, "cpp", Language::Cpp);
        let derived = result.symbols.iter().find(|s| s.name == "Derived").unwrap();
        assert_eq!(derived.extends.as_deref(), Some("Base"));
        assert!(result.symbols.iter().any(|s| s.name == "Derived.run"));
    }

    #[test]
    fn include_extracted() {
        let result = parse_file("#include <vector>\n", "cpp", Language::Cpp);
        assert_eq!(result.imports[0].source, "vector");
        assert!(result.imports[0].is_namespace);
    }

    #[test]
    fn free_function_exported() {
        let result = parse_file("int add(int a, int b) { return a + b; }\n", "cpp", Language::Cpp);
        assert!(result.exports.iter().any(|e| e.name == "add"));
    }
}
