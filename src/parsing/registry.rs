//! Process-wide grammar registry: one `tree_sitter::Language` per supported
//! grammar, built once and immutable thereafter. Grounded on the teacher's
//! `parsing/language_behavior.rs` architecture note (a fixed table, no
//! runtime plugin loading) and `parsing/factory.rs`.

use crate::types::Language;
use std::collections::HashMap;
use std::sync::OnceLock;
use tree_sitter::Language as TsLanguage;

fn build() -> HashMap<&'static str, TsLanguage> {
    let mut m = HashMap::new();
    m.insert("rust", tree_sitter_rust::LANGUAGE.into());
    m.insert("python", tree_sitter_python::LANGUAGE.into());
    m.insert("javascript", tree_sitter_javascript::LANGUAGE.into());
    m.insert(
        "typescript",
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    );
    m.insert("tsx", tree_sitter_typescript::LANGUAGE_TSX.into());
    m.insert("go", tree_sitter_go::LANGUAGE.into());
    m.insert("java", tree_sitter_java::LANGUAGE.into());
    m.insert("ruby", tree_sitter_ruby::LANGUAGE.into());
    m.insert("php", tree_sitter_php::LANGUAGE_PHP.into());
    m.insert("c", tree_sitter_c::LANGUAGE.into());
    m.insert("cpp", tree_sitter_cpp::LANGUAGE.into());
    m.insert("csharp", tree_sitter_c_sharp::LANGUAGE.into());
    m
}

static REGISTRY: OnceLock<HashMap<&'static str, TsLanguage>> = OnceLock::new();

/// Returns the grammar for `lang`. `.tsx` routes to the TSX grammar; every
/// other TypeScript extension uses the plain TS grammar (SPEC_FULL §4.3).
pub fn grammar_for(lang: Language, extension: &str) -> Option<TsLanguage> {
    let registry = REGISTRY.get_or_init(build);
    let key = if lang == Language::TypeScript && extension.eq_ignore_ascii_case("tsx") {
        "tsx"
    } else {
        lang.as_str()
    };
    registry.get(key).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_supported_language() {
        for lang in [
            Language::Rust,
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Go,
            Language::Java,
            Language::Ruby,
            Language::Php,
            Language::C,
            Language::Cpp,
            Language::CSharp,
        ] {
            assert!(grammar_for(lang, lang.as_str()).is_some());
        }
    }

    #[test]
    fn tsx_extension_routes_to_tsx_grammar() {
        let ts = grammar_for(Language::TypeScript, "ts").unwrap();
        let tsx = grammar_for(Language::TypeScript, "tsx").unwrap();
        assert_ne!(ts, tsx);
    }
}
