//! Graph Store: durable persistence for repos/files/symbols/modules/edges,
//! backed by an embedded transactional SQL engine (`duckdb`), per
//! SPEC_FULL.md §4.5. Grounded on `ArtemisMucaj-codesearch`'s
//! `duckdb_*_repository.rs` adapters: `Arc<Mutex<Connection>>`, schema
//! created via `execute_batch`, prepared statements on every hot path, one
//! `conn.transaction()` per multi-row mutation.
//!
//! `getNeighbours` runs in Rust, not as a recursive SQL CTE: a plain
//! breadth-first walk over edges fetched per direction, deduplicated by
//! edge id, matching the algorithm in spec.md §4.5 exactly.

use crate::error::{StorageError, StorageResult};
use crate::types::{Direction, EdgeId, FileId, ModuleId, NodeType, RepoId, Range, SymbolId, SymbolKind};
use duckdb::{params, Connection};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RepoRecord {
    pub id: RepoId,
    pub root_path: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: FileId,
    pub repo_id: RepoId,
    pub path: String,
    pub lang: String,
    pub sha256: String,
    pub mtime: i64,
    pub size_bytes: i64,
    pub last_indexed_at: i64,
}

#[derive(Debug, Clone)]
pub struct SymbolRow {
    pub id: SymbolId,
    pub repo_id: RepoId,
    pub file_id: FileId,
    pub kind: SymbolKind,
    pub name: String,
    pub fq_name: Option<String>,
    pub signature: Option<String>,
    pub range: Range,
    pub doc_comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSymbol {
    pub file_id: FileId,
    pub kind: SymbolKind,
    pub name: String,
    pub fq_name: Option<String>,
    pub signature: Option<String>,
    pub range: Range,
    pub doc_comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: ModuleId,
    pub repo_id: RepoId,
    pub name: String,
    pub version: Option<String>,
    pub manifest_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEdge {
    pub src_type: NodeType,
    pub src_id: i64,
    pub rel: &'static str,
    pub dst_type: NodeType,
    pub dst_id: i64,
    pub meta_json: Option<String>,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct EdgeRow {
    pub id: EdgeId,
    pub repo_id: RepoId,
    pub src_type: NodeType,
    pub src_id: i64,
    pub rel: String,
    pub dst_type: NodeType,
    pub dst_id: i64,
    pub meta_json: Option<String>,
    pub weight: f64,
    pub created_at: i64,
}

/// A graph node, keyed by type and id (spec.md §9: cyclic ownership modeled
/// through identifier-keyed rows, never owning references).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub node_type: NodeType,
    pub id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NeighbourResult {
    pub nodes: Vec<NodeRef>,
    pub edges: Vec<EdgeRow>,
}

pub struct GraphStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS seq_repos START 1;
CREATE TABLE IF NOT EXISTS repos (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_repos'),
    root_path TEXT NOT NULL UNIQUE,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);

CREATE SEQUENCE IF NOT EXISTS seq_files START 1;
CREATE TABLE IF NOT EXISTS files (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_files'),
    repo_id BIGINT NOT NULL,
    path TEXT NOT NULL,
    lang TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    mtime BIGINT NOT NULL,
    size_bytes BIGINT NOT NULL,
    last_indexed_at BIGINT NOT NULL,
    UNIQUE(repo_id, path)
);
CREATE INDEX IF NOT EXISTS idx_files_repo ON files(repo_id);

CREATE SEQUENCE IF NOT EXISTS seq_symbols START 1;
CREATE TABLE IF NOT EXISTS symbols (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_symbols'),
    repo_id BIGINT NOT NULL,
    file_id BIGINT NOT NULL,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    fq_name TEXT,
    signature TEXT,
    start_line INTEGER NOT NULL,
    start_col INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    end_col INTEGER NOT NULL,
    doc_comment TEXT
);
CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_id);
CREATE INDEX IF NOT EXISTS idx_symbols_repo_name ON symbols(repo_id, name);
CREATE INDEX IF NOT EXISTS idx_symbols_repo_fq ON symbols(repo_id, fq_name);

CREATE SEQUENCE IF NOT EXISTS seq_modules START 1;
CREATE TABLE IF NOT EXISTS modules (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_modules'),
    repo_id BIGINT NOT NULL,
    name TEXT NOT NULL,
    version TEXT,
    manifest_path TEXT,
    UNIQUE(repo_id, name)
);

CREATE SEQUENCE IF NOT EXISTS seq_edges START 1;
CREATE TABLE IF NOT EXISTS edges (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_edges'),
    repo_id BIGINT NOT NULL,
    src_type TEXT NOT NULL,
    src_id BIGINT NOT NULL,
    rel TEXT NOT NULL,
    dst_type TEXT NOT NULL,
    dst_id BIGINT NOT NULL,
    meta_json TEXT,
    weight DOUBLE NOT NULL DEFAULT 1.0,
    created_at BIGINT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_edges_src ON edges(repo_id, src_type, src_id);
CREATE INDEX IF NOT EXISTS idx_edges_dst ON edges(repo_id, dst_type, dst_id);
CREATE INDEX IF NOT EXISTS idx_edges_rel ON edges(repo_id, rel);

CREATE SEQUENCE IF NOT EXISTS seq_search START 1;
CREATE TABLE IF NOT EXISTS search_index (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_search'),
    repo_id BIGINT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id BIGINT NOT NULL,
    text TEXT NOT NULL,
    UNIQUE(repo_id, entity_type, entity_id)
);
"#;

impl GraphStore {
    /// Opens (creating if absent) the duckdb database file at `path` and
    /// ensures the schema exists. WAL-equivalent durability is DuckDB's
    /// default; no extra pragma is needed for the single-writer model this
    /// spec assumes (spec.md §6).
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    // ---------------------------------------------------------------- Repo

    pub fn repo_upsert(&self, root_path: &str, now: i64) -> StorageResult<RepoRecord> {
        let conn = self.lock()?;
        let existing: Option<(i64, i64)> = conn
            .query_row(
                "SELECT id, created_at FROM repos WHERE root_path = ?",
                params![root_path],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .ok();

        match existing {
            Some((id, created_at)) => {
                conn.execute(
                    "UPDATE repos SET updated_at = ? WHERE id = ?",
                    params![now, id],
                )?;
                Ok(RepoRecord {
                    id: RepoId(id),
                    root_path: root_path.to_string(),
                    created_at,
                    updated_at: now,
                })
            }
            None => {
                let id: i64 = conn.query_row(
                    "INSERT INTO repos (root_path, created_at, updated_at) VALUES (?, ?, ?) RETURNING id",
                    params![root_path, now, now],
                    |row| row.get(0),
                )?;
                Ok(RepoRecord {
                    id: RepoId(id),
                    root_path: root_path.to_string(),
                    created_at: now,
                    updated_at: now,
                })
            }
        }
    }

    pub fn repo_find_by_path(&self, root_path: &str) -> StorageResult<Option<RepoRecord>> {
        let conn = self.lock()?;
        let rec = conn
            .query_row(
                "SELECT id, root_path, created_at, updated_at FROM repos WHERE root_path = ?",
                params![root_path],
                |row| {
                    Ok(RepoRecord {
                        id: RepoId(row.get(0)?),
                        root_path: row.get(1)?,
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .ok();
        Ok(rec)
    }

    pub fn repo_find_by_id(&self, id: RepoId) -> StorageResult<Option<RepoRecord>> {
        let conn = self.lock()?;
        let rec = conn
            .query_row(
                "SELECT id, root_path, created_at, updated_at FROM repos WHERE id = ?",
                params![id.0],
                |row| {
                    Ok(RepoRecord {
                        id: RepoId(row.get(0)?),
                        root_path: row.get(1)?,
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .ok();
        Ok(rec)
    }

    // ---------------------------------------------------------------- File

    #[allow(clippy::too_many_arguments)]
    pub fn file_upsert(
        &self,
        repo_id: RepoId,
        path: &str,
        lang: &str,
        sha256: &str,
        mtime: i64,
        size_bytes: i64,
        now: i64,
    ) -> StorageResult<FileRecord> {
        let conn = self.lock()?;
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM files WHERE repo_id = ? AND path = ?",
                params![repo_id.0, path],
                |row| row.get(0),
            )
            .ok();

        let id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE files SET lang = ?, sha256 = ?, mtime = ?, size_bytes = ?, last_indexed_at = ? WHERE id = ?",
                    params![lang, sha256, mtime, size_bytes, now, id],
                )?;
                id
            }
            None => conn.query_row(
                "INSERT INTO files (repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
                params![repo_id.0, path, lang, sha256, mtime, size_bytes, now],
                |row| row.get(0),
            )?,
        };

        Ok(FileRecord {
            id: FileId(id),
            repo_id,
            path: path.to_string(),
            lang: lang.to_string(),
            sha256: sha256.to_string(),
            mtime,
            size_bytes,
            last_indexed_at: now,
        })
    }

    pub fn file_find_by_path(&self, repo_id: RepoId, path: &str) -> StorageResult<Option<FileRecord>> {
        let conn = self.lock()?;
        let rec = conn
            .query_row(
                "SELECT id, repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at \
                 FROM files WHERE repo_id = ? AND path = ?",
                params![repo_id.0, path],
                Self::row_to_file,
            )
            .ok();
        Ok(rec)
    }

    pub fn file_by_id(&self, id: FileId) -> StorageResult<Option<FileRecord>> {
        let conn = self.lock()?;
        let rec = conn
            .query_row(
                "SELECT id, repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at \
                 FROM files WHERE id = ?",
                params![id.0],
                Self::row_to_file,
            )
            .ok();
        Ok(rec)
    }

    pub fn file_list_by_repo(&self, repo_id: RepoId) -> StorageResult<Vec<FileRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, path, lang, sha256, mtime, size_bytes, last_indexed_at \
             FROM files WHERE repo_id = ? ORDER BY path",
        )?;
        let rows = stmt.query_map(params![repo_id.0], Self::row_to_file)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn row_to_file(row: &duckdb::Row) -> duckdb::Result<FileRecord> {
        Ok(FileRecord {
            id: FileId(row.get(0)?),
            repo_id: RepoId(row.get(1)?),
            path: row.get(2)?,
            lang: row.get(3)?,
            sha256: row.get(4)?,
            mtime: row.get(5)?,
            size_bytes: row.get(6)?,
            last_indexed_at: row.get(7)?,
        })
    }

    /// Deletes a File row and cascades per spec.md §3: every Symbol it owns,
    /// and every Edge touching the file or any of those symbols. Runs as one
    /// transaction.
    pub fn delete_file(&self, file_id: FileId) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::delete_file_cascade_tx(&tx, file_id)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_file_cascade_tx(tx: &duckdb::Transaction, file_id: FileId) -> StorageResult<()> {
        let symbol_ids: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT id FROM symbols WHERE file_id = ?")?;
            let rows = stmt.query_map(params![file_id.0], |row| row.get::<_, i64>(0))?;
            let mut ids = Vec::new();
            for r in rows {
                ids.push(r?);
            }
            ids
        };

        tx.execute(
            "DELETE FROM edges WHERE (src_type = 'file' AND src_id = ?1) OR (dst_type = 'file' AND dst_id = ?1)",
            params![file_id.0],
        )?;
        if !symbol_ids.is_empty() {
            let placeholders = symbol_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!(
                "DELETE FROM edges WHERE (src_type = 'symbol' AND src_id IN ({placeholders})) \
                 OR (dst_type = 'symbol' AND dst_id IN ({placeholders}))"
            );
            let mut stmt = tx.prepare(&sql)?;
            let params: Vec<&dyn duckdb::ToSql> = symbol_ids
                .iter()
                .chain(symbol_ids.iter())
                .map(|id| id as &dyn duckdb::ToSql)
                .collect();
            stmt.execute(params.as_slice())?;
        }
        tx.execute("DELETE FROM symbols WHERE file_id = ?", params![file_id.0])?;
        tx.execute("DELETE FROM files WHERE id = ?", params![file_id.0])?;
        tx.execute(
            "DELETE FROM search_index WHERE entity_type = 'file' AND entity_id = ?",
            params![file_id.0],
        )?;
        if !symbol_ids.is_empty() {
            let placeholders = symbol_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!(
                "DELETE FROM search_index WHERE entity_type = 'symbol' AND entity_id IN ({placeholders})"
            );
            let mut stmt = tx.prepare(&sql)?;
            let params: Vec<&dyn duckdb::ToSql> =
                symbol_ids.iter().map(|id| id as &dyn duckdb::ToSql).collect();
            stmt.execute(params.as_slice())?;
        }
        Ok(())
    }

    pub fn file_count_by_repo(&self, repo_id: RepoId) -> StorageResult<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM files WHERE repo_id = ?",
            params![repo_id.0],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn file_count_by_lang(&self, repo_id: RepoId) -> StorageResult<Vec<(String, u64)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT lang, COUNT(*) FROM files WHERE repo_id = ? GROUP BY lang ORDER BY lang",
        )?;
        let rows = stmt.query_map(params![repo_id.0], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    // -------------------------------------------------------------- Symbol

    /// Inserts symbols for `file_id` within a caller-supplied transaction
    /// (the indexer owns the per-file transaction boundary per spec.md §4.6
    /// step 3: delete-then-insert-then-derive-edges, all atomic).
    pub fn symbol_insert_many_tx(
        tx: &duckdb::Transaction,
        repo_id: RepoId,
        symbols: &[NewSymbol],
    ) -> StorageResult<Vec<SymbolId>> {
        let mut ids = Vec::with_capacity(symbols.len());
        let mut stmt = tx.prepare(
            "INSERT INTO symbols (repo_id, file_id, kind, name, fq_name, signature, \
             start_line, start_col, end_line, end_col, doc_comment) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )?;
        for s in symbols {
            let id: i64 = stmt.query_row(
                params![
                    repo_id.0,
                    s.file_id.0,
                    s.kind.as_str(),
                    s.name,
                    s.fq_name,
                    s.signature,
                    s.range.start_line,
                    s.range.start_col,
                    s.range.end_line,
                    s.range.end_col,
                    s.doc_comment,
                ],
                |row| row.get(0),
            )?;
            ids.push(SymbolId(id));
        }
        Ok(ids)
    }

    pub fn symbol_delete_by_file_tx(tx: &duckdb::Transaction, file_id: FileId) -> StorageResult<()> {
        tx.execute("DELETE FROM symbols WHERE file_id = ?", params![file_id.0])?;
        Ok(())
    }

    pub fn symbol_find_by_file(&self, file_id: FileId) -> StorageResult<Vec<SymbolRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, file_id, kind, name, fq_name, signature, \
             start_line, start_col, end_line, end_col, doc_comment \
             FROM symbols WHERE file_id = ? ORDER BY start_line, start_col",
        )?;
        let rows = stmt.query_map(params![file_id.0], Self::row_to_symbol)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn symbol_find_by_name(&self, repo_id: RepoId, name: &str) -> StorageResult<Vec<SymbolRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, file_id, kind, name, fq_name, signature, \
             start_line, start_col, end_line, end_col, doc_comment \
             FROM symbols WHERE repo_id = ? AND (name = ?1 OR fq_name = ?1)",
        )?;
        let rows = stmt.query_map(params![repo_id.0, name], Self::row_to_symbol)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn symbol_find_by_fq_name(&self, repo_id: RepoId, fq_name: &str) -> StorageResult<Option<SymbolRow>> {
        let conn = self.lock()?;
        let rec = conn
            .query_row(
                "SELECT id, repo_id, file_id, kind, name, fq_name, signature, \
                 start_line, start_col, end_line, end_col, doc_comment \
                 FROM symbols WHERE repo_id = ? AND fq_name = ?",
                params![repo_id.0, fq_name],
                Self::row_to_symbol,
            )
            .ok();
        Ok(rec)
    }

    pub fn symbol_find_by_id(&self, id: SymbolId) -> StorageResult<Option<SymbolRow>> {
        let conn = self.lock()?;
        let rec = conn
            .query_row(
                "SELECT id, repo_id, file_id, kind, name, fq_name, signature, \
                 start_line, start_col, end_line, end_col, doc_comment \
                 FROM symbols WHERE id = ?",
                params![id.0],
                Self::row_to_symbol,
            )
            .ok();
        Ok(rec)
    }

    pub fn symbol_count_by_repo(&self, repo_id: RepoId) -> StorageResult<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM symbols WHERE repo_id = ?",
            params![repo_id.0],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    fn row_to_symbol(row: &duckdb::Row) -> duckdb::Result<SymbolRow> {
        let kind_str: String = row.get(3)?;
        Ok(SymbolRow {
            id: SymbolId(row.get(0)?),
            repo_id: RepoId(row.get(1)?),
            file_id: FileId(row.get(2)?),
            kind: SymbolKind::from_str(&kind_str).unwrap_or(SymbolKind::Variable),
            name: row.get(4)?,
            fq_name: row.get(5)?,
            signature: row.get(6)?,
            range: Range::new(row.get(7)?, row.get(8)?, row.get(9)?, row.get(10)?),
            doc_comment: row.get(11)?,
        })
    }

    // -------------------------------------------------------------- Module

    pub fn module_upsert(
        &self,
        repo_id: RepoId,
        name: &str,
        version: Option<&str>,
        manifest_path: Option<&str>,
    ) -> StorageResult<ModuleRecord> {
        let conn = self.lock()?;
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM modules WHERE repo_id = ? AND name = ?",
                params![repo_id.0, name],
                |row| row.get(0),
            )
            .ok();

        let id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE modules SET version = COALESCE(?, version), manifest_path = COALESCE(?, manifest_path) WHERE id = ?",
                    params![version, manifest_path, id],
                )?;
                id
            }
            None => conn.query_row(
                "INSERT INTO modules (repo_id, name, version, manifest_path) VALUES (?, ?, ?, ?) RETURNING id",
                params![repo_id.0, name, version, manifest_path],
                |row| row.get(0),
            )?,
        };

        Ok(ModuleRecord {
            id: ModuleId(id),
            repo_id,
            name: name.to_string(),
            version: version.map(String::from),
            manifest_path: manifest_path.map(String::from),
        })
    }

    pub fn module_find_by_name(&self, repo_id: RepoId, name: &str) -> StorageResult<Option<ModuleRecord>> {
        let conn = self.lock()?;
        let rec = conn
            .query_row(
                "SELECT id, repo_id, name, version, manifest_path FROM modules WHERE repo_id = ? AND name = ?",
                params![repo_id.0, name],
                |row| {
                    Ok(ModuleRecord {
                        id: ModuleId(row.get(0)?),
                        repo_id: RepoId(row.get(1)?),
                        name: row.get(2)?,
                        version: row.get(3)?,
                        manifest_path: row.get(4)?,
                    })
                },
            )
            .ok();
        Ok(rec)
    }

    // ---------------------------------------------------------------- Edge

    pub fn edge_insert_many_tx(
        tx: &duckdb::Transaction,
        repo_id: RepoId,
        edges: &[NewEdge],
        now: i64,
    ) -> StorageResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO edges (repo_id, src_type, src_id, rel, dst_type, dst_id, meta_json, weight, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for e in edges {
            stmt.execute(params![
                repo_id.0,
                e.src_type.as_str(),
                e.src_id,
                e.rel,
                e.dst_type.as_str(),
                e.dst_id,
                e.meta_json,
                e.weight,
                now,
            ])?;
        }
        Ok(())
    }

    /// Deletes only the edges directly touching a file node (not its
    /// symbols). Exposed for callers that manage symbol deletion separately;
    /// `delete_file` above is the all-in-one cascade most callers want.
    pub fn edge_delete_by_file_tx(tx: &duckdb::Transaction, file_id: FileId) -> StorageResult<()> {
        tx.execute(
            "DELETE FROM edges WHERE (src_type = 'file' AND src_id = ?1) OR (dst_type = 'file' AND dst_id = ?1)",
            params![file_id.0],
        )?;
        Ok(())
    }

    pub fn edge_find_by_src(&self, repo_id: RepoId, src_type: NodeType, src_id: i64) -> StorageResult<Vec<EdgeRow>> {
        self.edge_query(
            "SELECT id, repo_id, src_type, src_id, rel, dst_type, dst_id, meta_json, weight, created_at \
             FROM edges WHERE repo_id = ? AND src_type = ? AND src_id = ?",
            params![repo_id.0, src_type.as_str(), src_id],
        )
    }

    pub fn edge_find_by_dst(&self, repo_id: RepoId, dst_type: NodeType, dst_id: i64) -> StorageResult<Vec<EdgeRow>> {
        self.edge_query(
            "SELECT id, repo_id, src_type, src_id, rel, dst_type, dst_id, meta_json, weight, created_at \
             FROM edges WHERE repo_id = ? AND dst_type = ? AND dst_id = ?",
            params![repo_id.0, dst_type.as_str(), dst_id],
        )
    }

    pub fn edge_find_by_rel(&self, repo_id: RepoId, rel: &str) -> StorageResult<Vec<EdgeRow>> {
        self.edge_query(
            "SELECT id, repo_id, src_type, src_id, rel, dst_type, dst_id, meta_json, weight, created_at \
             FROM edges WHERE repo_id = ? AND rel = ?",
            params![repo_id.0, rel],
        )
    }

    fn edge_query(&self, sql: &str, params: impl duckdb::Params) -> StorageResult<Vec<EdgeRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::row_to_edge)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn row_to_edge(row: &duckdb::Row) -> duckdb::Result<EdgeRow> {
        let src_type: String = row.get(2)?;
        let dst_type: String = row.get(5)?;
        Ok(EdgeRow {
            id: EdgeId(row.get(0)?),
            repo_id: RepoId(row.get(1)?),
            src_type: NodeType::from_str(&src_type).unwrap_or(NodeType::File),
            src_id: row.get(3)?,
            rel: row.get(4)?,
            dst_type: NodeType::from_str(&dst_type).unwrap_or(NodeType::File),
            dst_id: row.get(6)?,
            meta_json: row.get(7)?,
            weight: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    pub fn edge_count_by_repo(&self, repo_id: RepoId) -> StorageResult<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE repo_id = ?",
            params![repo_id.0],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Bounded breadth-first traversal, per spec.md §4.5: at each pop, fetch
    /// edges by `direction`; each edge is added (deduplicated by edge id)
    /// and its "other" endpoint enqueued if unseen. Nodes are returned
    /// unique and insertion-ordered starting with the seed.
    pub fn get_neighbours(
        &self,
        repo_id: RepoId,
        start: NodeRef,
        depth: u32,
        direction: Direction,
    ) -> StorageResult<NeighbourResult> {
        let mut visited: HashSet<NodeRef> = HashSet::new();
        let mut seen_edges: HashSet<i64> = HashSet::new();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        visited.insert(start);
        nodes.push(start);

        let mut frontier: VecDeque<(NodeRef, u32)> = VecDeque::new();
        frontier.push_back((start, 0));

        while let Some((node, hops)) = frontier.pop_front() {
            if hops >= depth {
                continue;
            }

            let mut candidate_edges = Vec::new();
            if matches!(direction, Direction::Outgoing | Direction::Both) {
                candidate_edges.extend(self.edge_find_by_src(repo_id, node.node_type, node.id)?);
            }
            if matches!(direction, Direction::Incoming | Direction::Both) {
                candidate_edges.extend(self.edge_find_by_dst(repo_id, node.node_type, node.id)?);
            }

            for edge in candidate_edges {
                if !seen_edges.insert(edge.id.0) {
                    continue;
                }
                let other = if edge.src_type == node.node_type && edge.src_id == node.id {
                    NodeRef {
                        node_type: edge.dst_type,
                        id: edge.dst_id,
                    }
                } else {
                    NodeRef {
                        node_type: edge.src_type,
                        id: edge.src_id,
                    }
                };
                edges.push(edge);
                if visited.insert(other) {
                    nodes.push(other);
                    frontier.push_back((other, hops + 1));
                }
            }
        }

        Ok(NeighbourResult { nodes, edges })
    }

    // --------------------------------------------------------- Search rows

    pub fn search_upsert_entry(&self, repo_id: RepoId, entity_type: NodeType, entity_id: i64, text: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM search_index WHERE repo_id = ? AND entity_type = ? AND entity_id = ?",
                params![repo_id.0, entity_type.as_str(), entity_id],
                |row| row.get(0),
            )
            .ok();
        match existing {
            Some(id) => {
                conn.execute("UPDATE search_index SET text = ? WHERE id = ?", params![text, id])?;
            }
            None => {
                conn.execute(
                    "INSERT INTO search_index (repo_id, entity_type, entity_id, text) VALUES (?, ?, ?, ?)",
                    params![repo_id.0, entity_type.as_str(), entity_id, text],
                )?;
            }
        }
        Ok(())
    }

    pub fn search_all_entries(&self, repo_id: RepoId) -> StorageResult<Vec<(NodeType, i64, String)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT entity_type, entity_id, text FROM search_index WHERE repo_id = ?",
        )?;
        let rows = stmt.query_map(params![repo_id.0], |row| {
            let entity_type: String = row.get(0)?;
            Ok((
                NodeType::from_str(&entity_type).unwrap_or(NodeType::File),
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Runs `body` inside one duckdb transaction, committing on success and
    /// rolling back (implicitly, via `Transaction::drop`) on error — spec.md
    /// §4.6 step 3 and §5's per-file atomicity contract.
    pub fn with_transaction<T>(
        &self,
        body: impl FnOnce(&duckdb::Transaction) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let result = body(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GraphStore {
        GraphStore::open_in_memory().unwrap()
    }

    #[test]
    fn repo_upsert_touches_updated_at() {
        let store = store();
        let first = store.repo_upsert("/repo", 100).unwrap();
        let second = store.repo_upsert("/repo", 200).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.updated_at, 200);
        assert_eq!(second.created_at, 100);
    }

    #[test]
    fn file_delete_cascades_symbols_and_edges() {
        let store = store();
        let repo = store.repo_upsert("/repo", 1).unwrap();
        let file = store
            .file_upsert(repo.id, "a.rs", "rust", "deadbeef", 1, 10, 1)
            .unwrap();

        let symbol_ids = store
            .with_transaction(|tx| {
                GraphStore::symbol_insert_many_tx(
                    tx,
                    repo.id,
                    &[NewSymbol {
                        file_id: file.id,
                        kind: SymbolKind::Function,
                        name: "f".into(),
                        fq_name: Some("f".into()),
                        signature: None,
                        range: Range::new(1, 0, 1, 5),
                        doc_comment: None,
                    }],
                )
            })
            .unwrap();

        store
            .with_transaction(|tx| {
                GraphStore::edge_insert_many_tx(
                    tx,
                    repo.id,
                    &[NewEdge {
                        src_type: NodeType::File,
                        src_id: file.id.0,
                        rel: "DEFINES",
                        dst_type: NodeType::Symbol,
                        dst_id: symbol_ids[0].0,
                        meta_json: None,
                        weight: 1.0,
                    }],
                    1,
                )
            })
            .unwrap();

        store.delete_file(file.id).unwrap();

        assert!(store.symbol_find_by_file(file.id).unwrap().is_empty());
        assert_eq!(store.edge_count_by_repo(repo.id).unwrap(), 0);
    }

    #[test]
    fn get_neighbours_depth_zero_is_seed_only() {
        let store = store();
        let repo = store.repo_upsert("/repo", 1).unwrap();
        let seed = NodeRef {
            node_type: NodeType::File,
            id: 1,
        };
        let result = store.get_neighbours(repo.id, seed, 0, Direction::Both).unwrap();
        assert_eq!(result.nodes, vec![seed]);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn get_neighbours_both_is_superset_of_outgoing() {
        let store = store();
        let repo = store.repo_upsert("/repo", 1).unwrap();
        let a = store.file_upsert(repo.id, "a.rs", "rust", "h1", 1, 1, 1).unwrap();
        let b = store.file_upsert(repo.id, "b.rs", "rust", "h2", 1, 1, 1).unwrap();
        store
            .with_transaction(|tx| {
                GraphStore::edge_insert_many_tx(
                    tx,
                    repo.id,
                    &[NewEdge {
                        src_type: NodeType::File,
                        src_id: b.id.0,
                        rel: "IMPORTS",
                        dst_type: NodeType::File,
                        dst_id: a.id.0,
                        meta_json: None,
                        weight: 1.0,
                    }],
                    1,
                )
            })
            .unwrap();

        let seed = NodeRef {
            node_type: NodeType::File,
            id: a.id.0,
        };
        let outgoing = store.get_neighbours(repo.id, seed, 1, Direction::Outgoing).unwrap();
        let both = store.get_neighbours(repo.id, seed, 1, Direction::Both).unwrap();
        assert!(outgoing.nodes.len() <= both.nodes.len());
        assert!(both.nodes.iter().any(|n| n.id == b.id.0));
    }
}
