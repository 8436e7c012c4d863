//! Indexer: full and incremental indexing passes over a repo root. Discovers
//! files, hashes and parses them in parallel, then applies the results to
//! the Graph Store and Search Index in deterministic, sorted-path order
//! (spec.md §4.6/§5).

mod resolve;

use crate::config::Settings;
use crate::discovery::{DiscoveredFile, FileDiscovery};
use crate::error::{ErrorContext, IndexError, IndexResult, StorageError};
use crate::hash::hash_bytes;
use crate::parsing::dispatcher::parse_file;
use crate::parsing::ParseResult;
use crate::storage::{GraphStore, NewEdge, NewSymbol, SearchIndex};
use crate::types::{FileId, NodeType, RelKind, RepoId, SymbolId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    Full,
    Incremental,
}

impl IndexMode {
    pub fn parse(s: &str) -> IndexResult<Self> {
        match s {
            "full" => Ok(Self::Full),
            "incremental" => Ok(Self::Incremental),
            other => Err(IndexError::InvalidMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IndexSummary {
    pub files_indexed: u64,
    pub files_skipped: u64,
    pub files_deleted: u64,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

/// Per-repo advisory lock enforcing single-writer indexing (spec.md §5).
/// Keyed on the canonicalized root path; held for the lifetime of one
/// `Indexer::run` call.
fn active_locks() -> &'static Mutex<HashSet<PathBuf>> {
    static LOCKS: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    LOCKS.get_or_init(|| Mutex::new(HashSet::new()))
}

struct RepoLockGuard(PathBuf);

impl RepoLockGuard {
    fn acquire(root: &Path) -> IndexResult<Self> {
        let mut locks = active_locks().lock().unwrap_or_else(|e| e.into_inner());
        if !locks.insert(root.to_path_buf()) {
            return Err(IndexError::IndexBusy {
                path: root.to_path_buf(),
            });
        }
        Ok(Self(root.to_path_buf()))
    }
}

impl Drop for RepoLockGuard {
    fn drop(&mut self) {
        if let Ok(mut locks) = active_locks().lock() {
            locks.remove(&self.0);
        }
    }
}

pub struct Indexer {
    store: GraphStore,
    search: SearchIndex,
    settings: Settings,
}

/// A file whose content changed (or a first-time full index) and therefore
/// needs parsing; `None` slots in the parallel map mean "skip, unchanged".
struct ParsedFile {
    discovered: DiscoveredFile,
    sha256: String,
    parsed: ParseResult,
}

impl Indexer {
    pub fn new(store: GraphStore, search: SearchIndex, settings: Settings) -> Self {
        Self {
            store,
            search,
            settings,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn search(&self) -> &SearchIndex {
        &self.search
    }

    /// Runs one indexing pass over `root`. `now` is caller-supplied (e.g.
    /// `chrono::Utc::now().timestamp()`) so the indexer stays a pure function
    /// of its inputs for a given clock reading.
    pub fn run(
        &self,
        root: &Path,
        mode: IndexMode,
        now: i64,
        cancel: &AtomicBool,
    ) -> IndexResult<IndexSummary> {
        let started = Instant::now();
        let root = root.canonicalize().with_path(root)?;
        let _lock = RepoLockGuard::acquire(&root)?;

        let root_str = root.to_string_lossy().to_string();
        let repo = self.store.repo_upsert(&root_str, now)?;

        let discovery = FileDiscovery::new(&self.settings);
        let discovered = discovery.discover(&root);
        let discovered_paths: HashSet<String> = discovered.iter().map(|f| f.path.clone()).collect();

        let existing: HashMap<String, (i64, String, i64, i64)> = self
            .store
            .file_list_by_repo(repo.id)?
            .into_iter()
            .map(|f| (f.path.clone(), (f.id.0, f.sha256, f.mtime, f.size_bytes)))
            .collect();

        let mut summary = IndexSummary::default();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.thread_count())
            .build()
            .map_err(|e| IndexError::General(format!("failed to build thread pool: {e}")))?;

        let parsed: Vec<Option<ParsedFile>> = pool.install(|| {
            discovered
                .par_iter()
                .map(|file| self.read_and_parse(file, mode, &existing))
                .collect()
        });

        // Phase 1: per-file atomic upsert of File + Symbols + own-file edges
        // (DEFINES/EXPORTS), applied in the sorted order `discovered` was
        // produced in (spec.md §5's reproducibility contract).
        let mut file_symbols: HashMap<String, Vec<String>> = HashMap::new();

        for slot in parsed {
            if cancel.load(Ordering::Relaxed) {
                summary.duration_ms = started.elapsed().as_millis() as u64;
                return Ok(summary);
            }
            let Some(item) = slot else {
                summary.files_skipped += 1;
                continue;
            };
            match self.apply_file(repo.id, &item, now, &mut summary) {
                Ok(fq_names) => {
                    file_symbols.insert(item.discovered.path.clone(), fq_names);
                    summary.files_indexed += 1;
                }
                Err(e) => {
                    summary
                        .warnings
                        .push(format!("{}: failed to persist: {e}", item.discovered.path));
                    summary.files_skipped += 1;
                }
            }
        }

        for (path, (id, ..)) in &existing {
            if !discovered_paths.contains(path) {
                self.store.delete_file(FileId(*id))?;
                summary.files_deleted += 1;
            }
        }

        if cancel.load(Ordering::Relaxed) {
            summary.duration_ms = started.elapsed().as_millis() as u64;
            return Ok(summary);
        }

        // Phase 2: cross-file edges, now that every file's symbols exist.
        self.derive_cross_file_edges(repo.id, &discovered, &file_symbols, now, &mut summary)?;
        self.rebuild_search(repo.id)?;

        summary.duration_ms = started.elapsed().as_millis() as u64;
        Ok(summary)
    }

    fn read_and_parse(
        &self,
        file: &DiscoveredFile,
        mode: IndexMode,
        existing: &HashMap<String, (i64, String, i64, i64)>,
    ) -> Option<ParsedFile> {
        let bytes = std::fs::read(&file.absolute_path).ok()?;
        let sha256 = hash_bytes(&bytes);

        if mode == IndexMode::Incremental {
            if let Some((_, old_sha, old_mtime, old_size)) = existing.get(&file.path) {
                if *old_sha == sha256 && *old_mtime == file.mtime && *old_size == file.size as i64 {
                    return None;
                }
            }
        }

        let source = String::from_utf8_lossy(&bytes).to_string();
        let extension = file
            .absolute_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let parsed = parse_file(&source, extension, file.lang);

        Some(ParsedFile {
            discovered: file.clone(),
            sha256,
            parsed,
        })
    }

    /// Phase 1 body (spec.md §4.6 step 3, one transaction): upsert the File
    /// row, clear its old symbols/edges, insert fresh symbols, and emit the
    /// edges that only need this file's own symbols. Returns the fq_names of
    /// the symbols just inserted, for phase 2 lookups.
    fn apply_file(
        &self,
        repo_id: RepoId,
        item: &ParsedFile,
        now: i64,
        summary: &mut IndexSummary,
    ) -> Result<Vec<String>, StorageError> {
        summary.warnings.extend(
            item.parsed
                .diagnostics
                .iter()
                .map(|d| format!("{}: {d}", item.discovered.path)),
        );

        self.store.with_transaction(|tx| {
            let file_id = file_upsert_tx(
                tx,
                repo_id,
                &item.discovered.path,
                item.discovered.lang.as_str(),
                &item.sha256,
                item.discovered.mtime,
                item.discovered.size as i64,
                now,
            )?;

            GraphStore::edge_delete_by_file_tx(tx, file_id)?;
            GraphStore::symbol_delete_by_file_tx(tx, file_id)?;

            let new_symbols: Vec<NewSymbol> = item
                .parsed
                .symbols
                .iter()
                .map(|s| NewSymbol {
                    file_id,
                    kind: s.kind,
                    name: short_name(&s.name),
                    fq_name: Some(s.name.clone()),
                    signature: s.signature.clone(),
                    range: s.range,
                    doc_comment: s.doc_comment.clone(),
                })
                .collect();

            let ids = GraphStore::symbol_insert_many_tx(tx, repo_id, &new_symbols)?;

            let mut by_short_name: HashMap<&str, SymbolId> = HashMap::new();
            let mut edges = Vec::with_capacity(ids.len());
            for (sym, id) in new_symbols.iter().zip(ids.iter()) {
                by_short_name.insert(sym.name.as_str(), *id);
                edges.push(NewEdge {
                    src_type: NodeType::File,
                    src_id: file_id.0,
                    rel: RelKind::Defines.as_str(),
                    dst_type: NodeType::Symbol,
                    dst_id: id.0,
                    meta_json: None,
                    weight: 1.0,
                });
            }

            for export in &item.parsed.exports {
                if let Some(id) = by_short_name.get(export.name.as_str()) {
                    edges.push(NewEdge {
                        src_type: NodeType::File,
                        src_id: file_id.0,
                        rel: RelKind::Exports.as_str(),
                        dst_type: NodeType::Symbol,
                        dst_id: id.0,
                        meta_json: None,
                        weight: 1.0,
                    });
                }
            }

            GraphStore::edge_insert_many_tx(tx, repo_id, &edges, now)?;

            Ok(new_symbols.iter().map(|s| s.fq_name.clone().unwrap_or_default()).collect())
        })
    }

    /// Phase 2: import resolution, `EXTENDS`/`IMPLEMENTS`, and the test-file
    /// heuristic, all of which need every file's symbols already persisted.
    fn derive_cross_file_edges(
        &self,
        repo_id: RepoId,
        discovered: &[DiscoveredFile],
        file_symbols: &HashMap<String, Vec<String>>,
        now: i64,
        summary: &mut IndexSummary,
    ) -> IndexResult<()> {
        let known_paths: HashSet<&str> = discovered.iter().map(|f| f.path.as_str()).collect();
        let file_ids: HashMap<String, FileId> = self
            .store
            .file_list_by_repo(repo_id)?
            .into_iter()
            .map(|f| (f.path, f.id))
            .collect();

        for file in discovered {
            let Some(fq_names) = file_symbols.get(&file.path) else {
                continue;
            };
            let Some(&file_id) = file_ids.get(&file.path) else {
                continue;
            };

            let source_bytes = match std::fs::read(&file.absolute_path) {
                Ok(b) => b,
                Err(_) => continue,
            };
            let source = String::from_utf8_lossy(&source_bytes).to_string();
            let extension = file
                .absolute_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            let parsed = parse_file(&source, extension, file.lang);

            let mut resolved_targets: Vec<FileId> = Vec::new();
            let mut edges = Vec::new();

            for import in &parsed.imports {
                match resolve::resolve_import(&file.path, &import.source, &known_paths) {
                    Some(target_path) => {
                        let Some(&target_id) = file_ids.get(&target_path) else {
                            continue;
                        };
                        edges.push(NewEdge {
                            src_type: NodeType::File,
                            src_id: file_id.0,
                            rel: RelKind::Imports.as_str(),
                            dst_type: NodeType::File,
                            dst_id: target_id.0,
                            meta_json: None,
                            weight: 1.0,
                        });
                        resolved_targets.push(target_id);

                        let target_symbols = self.store.symbol_find_by_file(target_id)?;
                        for name in &import.names {
                            if let Some(sym) = target_symbols.iter().find(|s| &s.name == name) {
                                edges.push(NewEdge {
                                    src_type: NodeType::File,
                                    src_id: file_id.0,
                                    rel: RelKind::References.as_str(),
                                    dst_type: NodeType::Symbol,
                                    dst_id: sym.id.0,
                                    meta_json: None,
                                    weight: 1.0,
                                });
                            }
                        }
                    }
                    None => {
                        let module = self.store.module_upsert(repo_id, &import.source, None, None)?;
                        edges.push(NewEdge {
                            src_type: NodeType::File,
                            src_id: file_id.0,
                            rel: RelKind::Imports.as_str(),
                            dst_type: NodeType::Module,
                            dst_id: module.id.0,
                            meta_json: None,
                            weight: 1.0,
                        });
                        summary
                            .warnings
                            .push(format!("{}: unresolved import '{}'", file.path, import.source));
                    }
                }
            }

            for fq_name in fq_names {
                let Some(record) = parsed.symbols.iter().find(|s| &s.name == fq_name) else {
                    continue;
                };
                let Some(symbol_row) = self.store.symbol_find_by_fq_name(repo_id, fq_name)? else {
                    continue;
                };

                if let Some(base) = &record.extends {
                    if let Some(target) = self.resolve_by_short_name(&resolved_targets, base)? {
                        edges.push(NewEdge {
                            src_type: NodeType::Symbol,
                            src_id: symbol_row.id.0,
                            rel: RelKind::Extends.as_str(),
                            dst_type: NodeType::Symbol,
                            dst_id: target.0,
                            meta_json: None,
                            weight: 1.0,
                        });
                    }
                }
                for iface in &record.implements {
                    if let Some(target) = self.resolve_by_short_name(&resolved_targets, iface)? {
                        edges.push(NewEdge {
                            src_type: NodeType::Symbol,
                            src_id: symbol_row.id.0,
                            rel: RelKind::Implements.as_str(),
                            dst_type: NodeType::Symbol,
                            dst_id: target.0,
                            meta_json: None,
                            weight: 1.0,
                        });
                    }
                }
            }

            if resolve::is_test_file(&file.path) {
                for target_id in &resolved_targets {
                    edges.push(NewEdge {
                        src_type: NodeType::File,
                        src_id: file_id.0,
                        rel: RelKind::Tests.as_str(),
                        dst_type: NodeType::File,
                        dst_id: target_id.0,
                        meta_json: None,
                        weight: 1.0,
                    });
                }
            }

            if !edges.is_empty() {
                self.store
                    .with_transaction(|tx| GraphStore::edge_insert_many_tx(tx, repo_id, &edges, now))?;
            }
        }

        Ok(())
    }

    /// Resolves a base-class/interface short name against the symbols of
    /// files this source file imports: "first match wins" (spec.md §4.6).
    fn resolve_by_short_name(&self, imported_files: &[FileId], short: &str) -> IndexResult<Option<SymbolId>> {
        for file_id in imported_files {
            let candidates = self.store.symbol_find_by_file(*file_id)?;
            if let Some(sym) = candidates.into_iter().find(|s| s.name == short) {
                return Ok(Some(sym.id));
            }
        }
        Ok(None)
    }

    fn rebuild_search(&self, repo_id: RepoId) -> IndexResult<()> {
        let mut entries = Vec::new();

        for file in self.store.file_list_by_repo(repo_id)? {
            let symbols = self.store.symbol_find_by_file(file.id)?;
            let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
            entries.push((NodeType::File, file.id.0, format!("{} {}", file.path, names.join(" "))));
            for symbol in &symbols {
                let text = format!(
                    "{} {}",
                    symbol.fq_name.as_deref().unwrap_or(&symbol.name),
                    symbol.signature.as_deref().unwrap_or_default()
                );
                entries.push((NodeType::Symbol, symbol.id.0, text));
            }
        }

        self.search.rebuild(repo_id, &entries)?;
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn file_upsert_tx(
    tx: &duckdb::Transaction,
    repo_id: RepoId,
    path: &str,
    lang: &str,
    sha256: &str,
    mtime: i64,
    size_bytes: i64,
    now: i64,
) -> Result<FileId, StorageError> {
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM files WHERE repo_id = ? AND path = ?",
            duckdb::params![repo_id.0, path],
            |row| row.get(0),
        )
        .ok();
    let id = match existing {
        Some(id) => {
            tx.execute(
                "UPDATE files SET lang = ?, sha256 = ?, mtime = ?, size_bytes = ?, last_indexed_at = ? WHERE id = ?",
                duckdb::params![lang, sha256, mtime, size_bytes, now, id],
            )?;
            id
        }
        None => tx.query_row(
            "INSERT INTO files (repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
            duckdb::params![repo_id.0, path, lang, sha256, mtime, size_bytes, now],
            |row| row.get(0),
        )?,
    };
    Ok(FileId(id))
}

fn short_name(fq: &str) -> String {
    fq.rsplit('.').next().unwrap_or(fq).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{GraphStore, SearchIndex};
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    fn indexer() -> Indexer {
        Indexer::new(
            GraphStore::open_in_memory().unwrap(),
            SearchIndex::open_in_memory().unwrap(),
            Settings::default(),
        )
    }

    #[test]
    fn full_index_then_incremental_is_a_noop() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "pub fn f() {}\n").unwrap();
        let indexer = indexer();
        let cancel = AtomicBool::new(false);

        let first = indexer.run(dir.path(), IndexMode::Full, 1, &cancel).unwrap();
        assert_eq!(first.files_indexed, 1);

        let second = indexer
            .run(dir.path(), IndexMode::Incremental, 2, &cancel)
            .unwrap();
        assert_eq!(second.files_indexed, 0);
        assert_eq!(second.files_skipped, 1);
    }

    #[test]
    fn two_file_repo_derives_expected_edges() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export class A {}\n").unwrap();
        std::fs::write(
            dir.path().join("b.ts"),
            "import {A} from \"./a\";\nexport class B extends A {}\n",
        )
        .unwrap();

        let indexer = indexer();
        let cancel = AtomicBool::new(false);
        let summary = indexer.run(dir.path(), IndexMode::Full, 1, &cancel).unwrap();
        assert_eq!(summary.files_indexed, 2);

        let repo = indexer
            .store()
            .repo_find_by_path(&dir.path().canonicalize().unwrap().to_string_lossy())
            .unwrap()
            .unwrap();

        let imports = indexer.store().edge_find_by_rel(repo.id, "IMPORTS").unwrap();
        assert!(imports.iter().any(|e| e.rel == "IMPORTS"));

        let extends = indexer.store().edge_find_by_rel(repo.id, "EXTENDS").unwrap();
        assert_eq!(extends.len(), 1);

        let references = indexer.store().edge_find_by_rel(repo.id, "REFERENCES").unwrap();
        assert_eq!(references.len(), 1);
    }

    #[test]
    fn deleted_file_is_reconciled_on_reindex() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "pub fn f() {}\n").unwrap();
        let indexer = indexer();
        let cancel = AtomicBool::new(false);
        indexer.run(dir.path(), IndexMode::Full, 1, &cancel).unwrap();

        std::fs::remove_file(dir.path().join("a.rs")).unwrap();
        let summary = indexer.run(dir.path(), IndexMode::Full, 2, &cancel).unwrap();
        assert_eq!(summary.files_deleted, 1);
    }
}
