//! Multi-language source parser: grammar registry, chunked-reader dispatcher
//! and one total extractor per supported language (spec.md §4.3/§4.4).

pub mod c;
pub mod cpp;
pub mod csharp;
pub mod dispatcher;
pub mod go;
pub mod java;
pub mod javascript;
pub mod php;
pub mod python;
pub mod registry;
pub mod ruby;
pub mod rust;
pub mod typescript;

use crate::types::{Language, Range, SymbolKind};
use tree_sitter::Node;

/// Import statement extracted from a single file, per spec.md §4.4.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportRecord {
    pub source: String,
    pub names: Vec<String>,
    pub is_default: bool,
    pub is_namespace: bool,
    pub is_type_only: bool,
    pub is_dynamic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportRecord {
    pub name: String,
    pub is_default: bool,
    pub is_re_export: bool,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub kind: SymbolKind,
    pub name: String,
    pub signature: Option<String>,
    pub range: Range,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub doc_comment: Option<String>,
}

/// Output of one extractor pass over a parsed file. Always total: a
/// structural surprise appends one diagnostic and returns whatever was
/// already recovered, per spec.md §4.4.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    pub symbols: Vec<SymbolRecord>,
    pub diagnostics: Vec<String>,
}

/// Recursion-depth guard shared by every extractor, following the teacher's
/// `MAX_AST_DEPTH`/`check_recursion_depth` pattern in the old
/// `parsing/parser.rs`.
pub const MAX_AST_DEPTH: usize = 500;

pub fn check_recursion_depth(depth: usize, diagnostics: &mut Vec<String>) -> bool {
    if depth >= MAX_AST_DEPTH {
        diagnostics.push(format!(
            "recursion depth {depth} exceeded maximum {MAX_AST_DEPTH}, subtree truncated"
        ));
        false
    } else {
        true
    }
}

/// UTF-8-safe node text extraction; never panics on malformed byte ranges.
pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or_default()
}

pub fn node_range(node: Node) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range::new(
        start.row as u32 + 1,
        start.column as u32,
        end.row as u32 + 1,
        end.column as u32,
    )
}

/// Dispatches to the per-language extractor for `lang`. Never panics: any
/// panic inside an extractor would violate the total-function contract, so
/// extractors are written defensively (pattern matches with wildcard arms)
/// rather than relying on `catch_unwind`.
pub fn extract(lang: Language, tree: &tree_sitter::Tree, source: &str) -> ParseResult {
    let root = tree.root_node();
    match lang {
        Language::Rust => rust::extract(root, source),
        Language::Python => python::extract(root, source),
        Language::JavaScript => javascript::extract(root, source, false),
        Language::TypeScript => typescript::extract(root, source),
        Language::Go => go::extract(root, source),
        Language::Java => java::extract(root, source),
        Language::Ruby => ruby::extract(root, source),
        Language::Php => php::extract(root, source),
        Language::C => c::extract(root, source),
        Language::Cpp => cpp::extract(root, source),
        Language::CSharp => csharp::extract(root, source),
    }
}
