//! Core identifiers and value types shared across the graph store, parser
//! dispatcher and retriever.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

id_type!(RepoId);
id_type!(FileId);
id_type!(SymbolId);
id_type!(ModuleId);
id_type!(EdgeId);

/// A source position: 1-based lines, 0-based columns, per spec.md §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Range {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Well-formedness invariant from spec.md §8: start_line <= end_line,
    /// and when equal, start_col <= end_col.
    pub fn is_well_formed(&self) -> bool {
        if self.start_line > self.end_line {
            return false;
        }
        if self.start_line == self.end_line && self.start_col > self.end_col {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Type,
    Variable,
    Enum,
    Property,
    Namespace,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Variable => "variable",
            SymbolKind::Enum => "enum",
            SymbolKind::Property => "property",
            SymbolKind::Namespace => "namespace",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "class" => SymbolKind::Class,
            "interface" => SymbolKind::Interface,
            "type" => SymbolKind::Type,
            "variable" => SymbolKind::Variable,
            "enum" => SymbolKind::Enum,
            "property" => SymbolKind::Property,
            "namespace" => SymbolKind::Namespace,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelKind {
    Imports,
    Exports,
    Defines,
    References,
    Extends,
    Implements,
    Tests,
}

impl RelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelKind::Imports => "IMPORTS",
            RelKind::Exports => "EXPORTS",
            RelKind::Defines => "DEFINES",
            RelKind::References => "REFERENCES",
            RelKind::Extends => "EXTENDS",
            RelKind::Implements => "IMPLEMENTS",
            RelKind::Tests => "TESTS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "IMPORTS" => RelKind::Imports,
            "EXPORTS" => RelKind::Exports,
            "DEFINES" => RelKind::Defines,
            "REFERENCES" => RelKind::References,
            "EXTENDS" => RelKind::Extends,
            "IMPLEMENTS" => RelKind::Implements,
            "TESTS" => RelKind::Tests,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Symbol,
    Module,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "file",
            NodeType::Symbol => "symbol",
            NodeType::Module => "module",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "file" => NodeType::File,
            "symbol" => NodeType::Symbol,
            "module" => NodeType::Module,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Go,
    Rust,
    Java,
    Ruby,
    Php,
    C,
    Cpp,
    CSharp,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "typescript" => Language::TypeScript,
            "javascript" => Language::JavaScript,
            "python" => Language::Python,
            "go" => Language::Go,
            "rust" => Language::Rust,
            "java" => Language::Java,
            "ruby" => Language::Ruby,
            "php" => Language::Php,
            "c" => Language::C,
            "cpp" => Language::Cpp,
            "csharp" => Language::CSharp,
            _ => return None,
        })
    }

    /// Extension table from SPEC_FULL.md §4.2.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "py" | "pyi" => Language::Python,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "java" => Language::Java,
            "rb" => Language::Ruby,
            "php" | "php3" | "php4" | "php5" | "php7" | "phtml" => Language::Php,
            "c" | "h" => Language::C,
            "cc" | "cpp" | "cxx" | "hpp" | "hh" => Language::Cpp,
            "cs" => Language::CSharp,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_well_formed() {
        assert!(Range::new(1, 0, 1, 5).is_well_formed());
        assert!(Range::new(1, 5, 2, 0).is_well_formed());
        assert!(!Range::new(2, 0, 1, 0).is_well_formed());
        assert!(!Range::new(1, 5, 1, 2).is_well_formed());
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("rb"), Some(Language::Ruby));
        assert_eq!(Language::from_extension("xyz"), None);
    }

    #[test]
    fn symbol_kind_round_trip() {
        for kind in [
            SymbolKind::Function,
            SymbolKind::Method,
            SymbolKind::Class,
            SymbolKind::Interface,
            SymbolKind::Type,
            SymbolKind::Variable,
            SymbolKind::Enum,
            SymbolKind::Property,
            SymbolKind::Namespace,
        ] {
            assert_eq!(SymbolKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn rel_kind_round_trip() {
        for kind in [
            RelKind::Imports,
            RelKind::Exports,
            RelKind::Defines,
            RelKind::References,
            RelKind::Extends,
            RelKind::Implements,
            RelKind::Tests,
        ] {
            assert_eq!(RelKind::from_str(kind.as_str()), Some(kind));
        }
    }
}
