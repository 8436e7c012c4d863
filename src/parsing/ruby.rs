//! Ruby extractor. No explicit export keyword, so every top-level symbol
//! whose name doesn't start with `_` is exported (spec.md §4.4 default
//! rule). `require`/`require_relative` calls become imports.

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
            "class" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source).to_string();
                let extends = child
                    .child_by_field_name("superclass")
                    .map(|s| node_text(s, source).trim_start_matches('<').trim().to_string());

                result.symbols.push(SymbolRecord {
                    kind: SymbolKind::Class,
                    name: name.clone(),
                    signature: None,
                    range: node_range(child),
                    extends,
                    implements: Vec::new(),
                    doc_comment: None,
                });
                if let Some(body) = child.child_by_field_name("body") {
                    walk(body, source, depth + 1, Some(&name), result);
                }
            }
            "module" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source).to_string();
                result.symbols.push(SymbolRecord {
                    kind: SymbolKind::Namespace,
                    name: name.clone(),
                    signature: None,
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: None,
                });
                if let Some(body) = child.child_by_field_name("body") {
                    walk(body, source, depth + 1, Some(&name), result);
                }
            }
            "method" | "singleton_method" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name_node, source);
                let (kind, full_name) = match enclosing {
                    Some(c) => (SymbolKind::Method, format!("{c}.{name}")),
                    None => (SymbolKind::Function, name.to_string()),
                };
                result.symbols.push(SymbolRecord {
                    kind,
                    name: full_name,
                    signature: None,
                    range: node_range(child),
                    extends: None,
                    implements: Vec::new(),
                    doc_comment: None,
                });
            }
            "call" => extract_require(child, source, result),
            "body_statement" | "program" => {
                walk(child, source, depth + 1, enclosing, result);
            }
            _ => {}
        }
    }
}

fn extract_require(node: Node, source: &str, result: &mut ParseResult) {
    let Some(method_node) = node.child_by_field_name("method") else {
        return;
    };
    let method = node_text(method_node, source);
    if method != "require" && method != "require_relative" {
        return;
    }
    let Some(args) = node.child_by_field_name("arguments") else {
        return;
    };
    let mut cursor = args.walk();
    for arg in args.children(&mut cursor) {
        if arg.kind() == "string" {
            let path = node_text(arg, source).trim_matches('"').trim_matches('\'').to_string();
            let name = path.rsplit('/').next().unwrap_or(&path).to_string();
            result.imports.push(ImportRecord {
                source: path,
                names: vec![name],
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
    fn class_with_method_and_require() {
        let src = "require \"json\"\n\nclass Greeter\n  def hello\n  end\nend\n";
        let result = parse_file(src, "rb", Language::Ruby);
        assert!(result.symbols.iter().any(|s| s.name == "Greeter"));
        assert!(result.symbols.iter().any(|s| s.name == "Greeter.hello"));
        assert_eq!(result.imports[0].source, "json");
    }

    #[test]
    fn leading_underscore_not_exported() {
        let result = parse_file("def _private\nend\ndef public_one\nend\n", "rb", Language::Ruby);
        assert_eq!(result.exports.len(), 1);
        assert_eq!(result.exports[0].name, "public_one");
    }
}
