//! The five external operations (spec.md §6), shared verbatim by the CLI and
//! the MCP server so neither surface carries indexing/retrieval logic of its
//! own — both just marshal arguments into these functions.

use crate::config::Settings;
use crate::error::{ErrorContext, IndexError, IndexResult};
use crate::indexing::{IndexMode, IndexSummary, Indexer};
use crate::retrieve::{clamp_budget, ContextBundle, Hints, Retriever};
use crate::storage::{GraphStore, SearchIndex};
use crate::types::RepoId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

const MAX_SNIPPET_LINES: u32 = 500;

/// Canonicalizes `repo_path` and opens its graph store + search index at the
/// configured `index_path`. Shared by every operation below.
fn open_repo(settings: &Settings, repo_path: &Path) -> IndexResult<(PathBuf, GraphStore, SearchIndex)> {
    let root = repo_path.canonicalize().with_path(repo_path)?;
    let index_dir = settings.resolved_index_path(&root);
    let store = GraphStore::open(&index_dir.join("graph.duckdb"))?;
    let search = SearchIndex::open_in_dir(&index_dir.join("search"))?;
    Ok((root, store, search))
}

/// Canonicalizes `file_path` relative to `root` and rejects it if it escapes
/// the repo root (spec.md §6's shared path-safety contract).
pub fn safe_join(root: &Path, file_path: &str) -> IndexResult<PathBuf> {
    let candidate = root.join(file_path);
    let canonical = candidate
        .canonicalize()
        .map_err(|e| IndexError::FileRead {
            path: candidate.clone(),
            source: e,
        })?;
    if !canonical.starts_with(root) {
        return Err(IndexError::PathTraversal {
            path: canonical,
            root: root.to_path_buf(),
        });
    }
    Ok(canonical)
}

/// `repo_index`: full or incremental indexing pass over `repo_path`.
pub fn repo_index(
    settings: &Settings,
    repo_path: &Path,
    mode: IndexMode,
    now: i64,
) -> IndexResult<IndexSummary> {
    let root = repo_path.canonicalize().with_path(repo_path)?;
    let index_dir = settings.resolved_index_path(&root);
    let store = GraphStore::open(&index_dir.join("graph.duckdb"))?;
    let search = SearchIndex::open_in_dir(&index_dir.join("search"))?;
    let indexer = Indexer::new(store, search, settings.clone());
    let cancel = AtomicBool::new(false);
    indexer.run(&root, mode, now, &cancel)
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepoStatus {
    NotIndexed,
    Indexed {
        repo_id: i64,
        root_path: String,
        last_indexed_at: i64,
        file_counts: FileCounts,
        symbol_count: u64,
        edge_count: u64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileCounts {
    pub total: u64,
    pub by_lang: Vec<(String, u64)>,
}

/// `repo_status`: reports whether `repo_path` has been indexed and, if so,
/// the current counts.
pub fn repo_status(settings: &Settings, repo_path: &Path) -> IndexResult<RepoStatus> {
    let root = repo_path.canonicalize().with_path(repo_path)?;
    let root_str = root.to_string_lossy().to_string();
    let index_dir = settings.resolved_index_path(&root);
    if !index_dir.join("graph.duckdb").is_file() {
        return Ok(RepoStatus::NotIndexed);
    }
    let store = GraphStore::open(&index_dir.join("graph.duckdb"))?;
    let Some(repo) = store.repo_find_by_path(&root_str)? else {
        return Ok(RepoStatus::NotIndexed);
    };

    let total = store.file_count_by_repo(repo.id)?;
    let by_lang = store.file_count_by_lang(repo.id)?;
    let symbol_count = store.symbol_count_by_repo(repo.id)?;
    let edge_count = store.edge_count_by_repo(repo.id)?;

    Ok(RepoStatus::Indexed {
        repo_id: repo.id.0,
        root_path: repo.root_path,
        last_indexed_at: repo.updated_at,
        file_counts: FileCounts { total, by_lang },
        symbol_count,
        edge_count,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    pub entity_type: String,
    pub entity_id: i64,
    pub name: String,
    pub path: String,
    pub score: f32,
}

/// `repo_search`: BM25 full-text search scoped to `repo_path`.
pub fn repo_search(
    settings: &Settings,
    repo_path: &Path,
    query: &str,
    limit: usize,
) -> IndexResult<Vec<SearchResultItem>> {
    let (root, store, search) = open_repo(settings, repo_path)?;
    let root_str = root.to_string_lossy().to_string();
    let Some(repo) = store.repo_find_by_path(&root_str)? else {
        return Err(IndexError::NotIndexed { path: root });
    };

    let hits = search.search(repo.id, query, limit)?;
    let mut out = Vec::with_capacity(hits.len());
    for hit in hits {
        let (name, path) = describe_hit(&store, repo.id, hit.entity_type, hit.entity_id)?;
        out.push(SearchResultItem {
            entity_type: hit.entity_type.as_str().to_string(),
            entity_id: hit.entity_id,
            name,
            path,
            score: hit.score,
        });
    }
    Ok(out)
}

fn describe_hit(
    store: &GraphStore,
    _repo_id: RepoId,
    entity_type: crate::types::NodeType,
    entity_id: i64,
) -> IndexResult<(String, String)> {
    use crate::types::{FileId, NodeType, SymbolId};
    match entity_type {
        NodeType::Symbol => {
            if let Some(sym) = store.symbol_find_by_id(SymbolId(entity_id))? {
                let path = store
                    .file_by_id(sym.file_id)?
                    .map(|f| f.path)
                    .unwrap_or_default();
                Ok((sym.fq_name.unwrap_or(sym.name), path))
            } else {
                Ok((String::new(), String::new()))
            }
        }
        NodeType::File => {
            if let Some(file) = store.file_by_id(FileId(entity_id))? {
                Ok((file.path.clone(), file.path))
            } else {
                Ok((String::new(), String::new()))
            }
        }
        NodeType::Module => Ok((String::new(), String::new())),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnippetResult {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub total_lines: u32,
    pub text: String,
}

/// `repo_snippet`: reads `[start_line..end_line]` (clamped to the file's
/// bounds and a 500-line cap) from `file_path`, which must resolve inside
/// `repo_path` (spec.md §6).
pub fn repo_snippet(
    repo_path: &Path,
    file_path: &str,
    start_line: Option<u32>,
    end_line: Option<u32>,
) -> IndexResult<SnippetResult> {
    let root = repo_path.canonicalize().with_path(repo_path)?;
    let target = safe_join(&root, file_path)?;

    let contents = std::fs::read_to_string(&target).with_path(&target)?;
    let lines: Vec<&str> = contents.lines().collect();
    let total_lines = lines.len() as u32;

    let requested_start = start_line.unwrap_or(1).max(1);
    let requested_end = end_line.unwrap_or(total_lines.max(1));

    let start = requested_start.min(total_lines.max(1));
    let mut end = requested_end.max(start).min(total_lines.max(1));
    if end - start + 1 > MAX_SNIPPET_LINES {
        end = start + MAX_SNIPPET_LINES - 1;
    }

    let text = lines
        .get((start.saturating_sub(1)) as usize..end as usize)
        .unwrap_or(&[])
        .join("\n");

    Ok(SnippetResult {
        path: file_path.to_string(),
        start_line: start,
        end_line: end,
        total_lines,
        text,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ContextOutcome {
    Bundle(ContextBundle),
    NotIndexed { error: String, suggestion: String },
}

/// `repo_context_get`: task + hints + budget -> a ranked context bundle, or
/// the `{error, suggestion: "repo_index"}` shape if `repo_path` has never
/// been indexed (the only non-exceptional failure mode, spec.md §4.7).
pub fn repo_context_get(
    settings: &Settings,
    repo_path: &Path,
    task: &str,
    budget: Option<i64>,
    hints: Hints,
) -> IndexResult<ContextOutcome> {
    let (root, store, search) = open_repo(settings, repo_path)?;
    let root_str = root.to_string_lossy().to_string();
    let Some(repo) = store.repo_find_by_path(&root_str)? else {
        return Ok(ContextOutcome::NotIndexed {
            error: format!("repo '{root_str}' is not indexed"),
            suggestion: "repo_index".to_string(),
        });
    };

    let retriever = Retriever::new(&store, &search);
    let budget = clamp_budget(budget);
    let bundle = retriever
        .get_context(&root, repo.id, task, Some(budget), &hints)
        .map_err(|e| IndexError::General(e.to_string()))?;
    Ok(ContextOutcome::Bundle(bundle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn status_is_not_indexed_before_first_index() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::default();
        let status = repo_status(&settings, dir.path()).unwrap();
        assert!(matches!(status, RepoStatus::NotIndexed));
    }

    #[test]
    fn index_then_status_reports_counts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "pub fn f() {}\n").unwrap();
        let settings = Settings::default();

        let summary = repo_index(&settings, dir.path(), IndexMode::Full, 1).unwrap();
        assert_eq!(summary.files_indexed, 1);

        let status = repo_status(&settings, dir.path()).unwrap();
        match status {
            RepoStatus::Indexed { file_counts, symbol_count, .. } => {
                assert_eq!(file_counts.total, 1);
                assert_eq!(symbol_count, 1);
            }
            RepoStatus::NotIndexed => panic!("expected indexed status"),
        }
    }

    #[test]
    fn snippet_clamps_to_file_bounds() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();

        let snippet = repo_snippet(dir.path(), "a.txt", Some(1), Some(2000)).unwrap();
        assert_eq!(snippet.total_lines, 3);
        assert_eq!(snippet.start_line, 1);
        assert_eq!(snippet.end_line, 3);
    }

    #[test]
    fn snippet_rejects_path_escaping_repo_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hi\n").unwrap();
        let outside = TempDir::new().unwrap();
        let outside_file = outside.path().join("secret.txt");
        std::fs::write(&outside_file, "nope\n").unwrap();

        let absolute_escape = outside_file.to_string_lossy().to_string();
        let result = repo_snippet(dir.path(), &absolute_escape, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn context_get_on_unindexed_repo_returns_suggestion() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::default();
        let outcome = repo_context_get(&settings, dir.path(), "fix the bug", None, Hints::default()).unwrap();
        match outcome {
            ContextOutcome::NotIndexed { suggestion, .. } => assert_eq!(suggestion, "repo_index"),
            ContextOutcome::Bundle(_) => panic!("expected not-indexed outcome"),
        }
    }
}
