//! End-to-end coverage of the five external operations (spec.md §6) against
//! real files on disk, exercising the full index -> status -> search ->
//! snippet -> context pipeline the way the CLI and MCP surfaces do.

use codegraph::config::Settings;
use codegraph::indexing::IndexMode;
use codegraph::ops::{self, ContextOutcome, RepoStatus};
use codegraph::retrieve::Hints;
use tempfile::TempDir;

fn settings() -> Settings {
    Settings::default()
}

#[test]
fn status_transitions_from_not_indexed_to_indexed() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.py"), "def greet():\n    pass\n").unwrap();
    let settings = settings();

    assert!(matches!(
        ops::repo_status(&settings, dir.path()).unwrap(),
        RepoStatus::NotIndexed
    ));

    let summary = ops::repo_index(&settings, dir.path(), IndexMode::Full, 1).unwrap();
    assert_eq!(summary.files_indexed, 1);

    match ops::repo_status(&settings, dir.path()).unwrap() {
        RepoStatus::Indexed { file_counts, symbol_count, .. } => {
            assert_eq!(file_counts.total, 1);
            assert_eq!(symbol_count, 1);
        }
        RepoStatus::NotIndexed => panic!("expected indexed status after repo_index"),
    }
}

#[test]
fn incremental_reindex_on_unchanged_tree_is_a_noop() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.go"), "package main\n\nfunc main() {}\n").unwrap();
    let settings = settings();

    let first = ops::repo_index(&settings, dir.path(), IndexMode::Full, 1).unwrap();
    assert_eq!(first.files_indexed, 1);

    let second = ops::repo_index(&settings, dir.path(), IndexMode::Incremental, 2).unwrap();
    assert_eq!(second.files_indexed, 0);
    assert_eq!(second.files_skipped, 1);
}

#[test]
fn search_finds_indexed_symbol_by_name() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("lib.rs"),
        "pub fn parse_config() {}\npub fn write_output() {}\n",
    )
    .unwrap();
    let settings = settings();
    ops::repo_index(&settings, dir.path(), IndexMode::Full, 1).unwrap();

    let results = ops::repo_search(&settings, dir.path(), "parse_config", 10).unwrap();
    assert!(results.iter().any(|r| r.name.contains("parse_config")));
}

#[test]
fn snippet_clamps_start_and_end_to_file_bounds() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("short.txt"), (0..50).map(|n| format!("line {n}\n")).collect::<String>()).unwrap();

    let snippet = ops::repo_snippet(dir.path(), "short.txt", Some(1000), Some(2000)).unwrap();
    assert_eq!(snippet.total_lines, 50);
    assert_eq!(snippet.start_line, 50);
    assert_eq!(snippet.end_line, 50);
}

#[test]
fn context_get_on_unindexed_repo_suggests_repo_index() {
    let dir = TempDir::new().unwrap();
    let settings = settings();

    let outcome = ops::repo_context_get(&settings, dir.path(), "understand auth flow", None, Hints::default())
        .unwrap();
    match outcome {
        ContextOutcome::NotIndexed { suggestion, .. } => assert_eq!(suggestion, "repo_index"),
        ContextOutcome::Bundle(_) => panic!("expected a not-indexed outcome"),
    }
}

#[test]
fn context_get_on_indexed_repo_seeds_focus_from_hint_symbol() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("service.ts"),
        "export class AuthService {\n  login() {}\n}\n",
    )
    .unwrap();
    let settings = settings();
    ops::repo_index(&settings, dir.path(), IndexMode::Full, 1).unwrap();

    let hints = Hints {
        paths: vec![],
        symbols: vec!["AuthService".to_string()],
        lang: None,
    };
    let outcome = ops::repo_context_get(&settings, dir.path(), "understand AuthService", None, hints).unwrap();
    match outcome {
        ContextOutcome::Bundle(bundle) => {
            assert!(bundle.focus.iter().any(|f| f.name.contains("AuthService")));
        }
        ContextOutcome::NotIndexed { .. } => panic!("expected a context bundle"),
    }
}

#[test]
fn deleted_file_disappears_from_status_counts_after_reindex() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.rs"), "pub fn f() {}\n").unwrap();
    std::fs::write(dir.path().join("b.rs"), "pub fn g() {}\n").unwrap();
    let settings = settings();

    ops::repo_index(&settings, dir.path(), IndexMode::Full, 1).unwrap();
    std::fs::remove_file(dir.path().join("b.rs")).unwrap();
    let summary = ops::repo_index(&settings, dir.path(), IndexMode::Full, 2).unwrap();
    assert_eq!(summary.files_deleted, 1);

    match ops::repo_status(&settings, dir.path()).unwrap() {
        RepoStatus::Indexed { file_counts, .. } => assert_eq!(file_counts.total, 1),
        RepoStatus::NotIndexed => panic!("expected indexed status"),
    }
}
