//! Import-to-file resolution and the test-file heuristic (spec.md §4.6).
//!
//! Relative imports (`./a`, `../lib/b`) are resolved by joining against the
//! importing file's directory and trying the supported extensions plus an
//! `/index.<ext>` fallback. Bare specifiers fall back to a best-effort
//! basename search within the repo tree — the open-question resolution
//! recorded in DESIGN.md for C/C++ `#include` and Ruby `require`, applied
//! uniformly since it is a safe no-op when a relative resolution already
//! succeeded.

use std::collections::HashSet;

const CANDIDATE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "go", "rs", "java", "rb", "php", "c", "h", "cc",
    "cpp", "hpp", "cs",
];

pub fn resolve_import(importing_path: &str, source: &str, known_paths: &HashSet<&str>) -> Option<String> {
    if source.starts_with('.') {
        let dir = parent_dir(importing_path);
        let joined = normalize(&join(&dir, source));

        if known_paths.contains(joined.as_str()) {
            return Some(joined);
        }
        for ext in CANDIDATE_EXTENSIONS {
            let candidate = format!("{joined}.{ext}");
            if known_paths.contains(candidate.as_str()) {
                return Some(candidate);
            }
            let index_candidate = format!("{joined}/index.{ext}");
            if known_paths.contains(index_candidate.as_str()) {
                return Some(index_candidate);
            }
        }
        return None;
    }

    // Bare specifier: best-effort basename search (C/C++ #include, Ruby
    // require, and similar language families with no explicit relative
    // marker for in-repo files).
    let basename = source.rsplit('/').next().unwrap_or(source);
    let stem = basename.rsplit('.').next().unwrap_or(basename);
    known_paths
        .iter()
        .find(|p| {
            let file_stem = p
                .rsplit('/')
                .next()
                .unwrap_or(p)
                .rsplit('.')
                .next()
                .unwrap_or(p);
            file_stem == stem || p.ends_with(basename)
        })
        .map(|p| p.to_string())
}

fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

fn join(dir: &str, rel: &str) -> String {
    if dir.is_empty() {
        rel.to_string()
    } else {
        format!("{dir}/{rel}")
    }
}

/// Collapses `.` and `..` components without touching the filesystem.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Test-file heuristic: `**/*.test.*` or `**/__tests__/**` (spec.md §4.6).
pub fn is_test_file(path: &str) -> bool {
    if path.split('/').any(|seg| seg == "__tests__") {
        return true;
    }
    let filename = path.rsplit('/').next().unwrap_or(path);
    filename.contains(".test.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_sibling_with_extension() {
        let known: HashSet<&str> = ["a.ts", "b.ts"].into_iter().collect();
        assert_eq!(resolve_import("b.ts", "./a", &known), Some("a.ts".to_string()));
    }

    #[test]
    fn resolves_nested_relative_import() {
        let known: HashSet<&str> = ["lib/a.ts", "src/b.ts"].into_iter().collect();
        assert_eq!(
            resolve_import("src/b.ts", "../lib/a", &known),
            Some("lib/a.ts".to_string())
        );
    }

    #[test]
    fn bare_specifier_falls_back_to_basename_search() {
        let known: HashSet<&str> = ["include/vendor/util.h"].into_iter().collect();
        assert_eq!(
            resolve_import("main.c", "util.h", &known),
            Some("include/vendor/util.h".to_string())
        );
    }

    #[test]
    fn unresolvable_import_returns_none() {
        let known: HashSet<&str> = ["a.ts"].into_iter().collect();
        assert_eq!(resolve_import("b.ts", "react", &known), None);
    }

    #[test]
    fn test_file_heuristics() {
        assert!(is_test_file("src/__tests__/foo.ts"));
        assert!(is_test_file("src/foo.test.ts"));
        assert!(!is_test_file("src/footest.ts"));
    }
}
