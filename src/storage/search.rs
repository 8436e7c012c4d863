//! Full-text search index over symbol and file entries, backed by tantivy.
//! Mirrors the `search_index` rows from [`super::graph::GraphStore`]: the
//! graph store is the source of truth, this index is a derived, rebuildable
//! projection used purely for BM25-ranked lookup (spec.md §4.5's
//! `SearchEntry` entity, §4.7 seeding-by-task).

use crate::error::{StorageError, StorageResult};
use crate::types::{NodeType, RepoId};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

pub struct SearchFields {
    pub repo_id: Field,
    pub entity_type: Field,
    pub entity_id: Field,
    pub text: Field,
}

fn build_schema() -> (Schema, SearchFields) {
    let mut builder = Schema::builder();
    let repo_id = builder.add_i64_field("repo_id", STORED);
    let entity_type = builder.add_text_field("entity_type", STRING | STORED);
    let entity_id = builder.add_i64_field("entity_id", STORED);
    let text = builder.add_text_field("text", TEXT | STORED);
    let schema = builder.build();
    (
        schema,
        SearchFields {
            repo_id,
            entity_type,
            entity_id,
            text,
        },
    )
}

pub struct SearchHit {
    pub entity_type: NodeType,
    pub entity_id: i64,
    pub score: f32,
}

/// Wraps a tantivy index plus a long-lived writer. Rebuilt wholesale on each
/// full reindex (`rebuild`); individual entries can be appended during
/// incremental indexing via `upsert`.
pub struct SearchIndex {
    index: Index,
    fields: SearchFields,
    writer: std::sync::Mutex<IndexWriter>,
    reader: IndexReader,
}

impl SearchIndex {
    pub fn open_in_dir(dir: &std::path::Path) -> StorageResult<Self> {
        std::fs::create_dir_all(dir).map_err(|e| StorageError::Migration(e.to_string()))?;
        let (schema, fields) = build_schema();
        let index = match Index::open_in_dir(dir) {
            Ok(idx) => idx,
            Err(_) => Index::create_in_dir(dir, schema)?,
        };
        Self::from_index(index, fields)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        Self::from_index(index, fields)
    }

    fn from_index(index: Index, fields: SearchFields) -> StorageResult<Self> {
        let writer = index.writer(16 * 1024 * 1024)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        Ok(Self {
            index,
            fields,
            writer: std::sync::Mutex::new(writer),
            reader,
        })
    }

    /// Drops every document for `repo_id` and re-adds the supplied entries,
    /// then commits. Used after a full reindex pass.
    pub fn rebuild(&self, repo_id: RepoId, entries: &[(NodeType, i64, String)]) -> StorageResult<()> {
        let mut writer = self.writer.lock().map_err(|_| StorageError::LockPoisoned)?;
        let term = tantivy::Term::from_field_i64(self.fields.repo_id, repo_id.0);
        writer.delete_term(term);
        for (entity_type, entity_id, text) in entries {
            writer.add_document(doc!(
                self.fields.repo_id => repo_id.0,
                self.fields.entity_type => entity_type.as_str(),
                self.fields.entity_id => *entity_id,
                self.fields.text => text.clone(),
            ))?;
        }
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    pub fn upsert(&self, repo_id: RepoId, entity_type: NodeType, entity_id: i64, text: &str) -> StorageResult<()> {
        let mut writer = self.writer.lock().map_err(|_| StorageError::LockPoisoned)?;
        let id_term = tantivy::Term::from_field_i64(self.fields.entity_id, entity_id);
        writer.delete_term(id_term);
        writer.add_document(doc!(
            self.fields.repo_id => repo_id.0,
            self.fields.entity_type => entity_type.as_str(),
            self.fields.entity_id => entity_id,
            self.fields.text => text,
        ))?;
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Case-insensitive BM25 search scoped to `repo_id`, per spec.md §4.5.
    pub fn search(&self, repo_id: RepoId, query: &str, limit: usize) -> StorageResult<Vec<SearchHit>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.fields.text]);
        let parsed = parser
            .parse_query(query)
            .map_err(|e| StorageError::QueryParse(e.to_string()))?;

        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(limit.max(1) * 4))?;
        let mut hits = Vec::new();
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let doc_repo_id = doc
                .get_first(self.fields.repo_id)
                .and_then(|v| v.as_i64())
                .unwrap_or(-1);
            if doc_repo_id != repo_id.0 {
                continue;
            }
            let entity_type = doc
                .get_first(self.fields.entity_type)
                .and_then(|v| v.as_str())
                .and_then(NodeType::from_str)
                .unwrap_or(NodeType::File);
            let entity_id = doc
                .get_first(self.fields.entity_id)
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            hits.push(SearchHit {
                entity_type,
                entity_id,
                score,
            });
            if hits.len() >= limit {
                break;
            }
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_finds_matching_entry() {
        let index = SearchIndex::open_in_memory().unwrap();
        let repo = RepoId(1);
        index
            .rebuild(
                repo,
                &[
                    (NodeType::Symbol, 1, "parse_config loads settings".to_string()),
                    (NodeType::Symbol, 2, "write_output flushes buffer".to_string()),
                ],
            )
            .unwrap();

        let hits = index.search(repo, "settings", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, 1);
    }

    #[test]
    fn search_scoped_to_repo() {
        let index = SearchIndex::open_in_memory().unwrap();
        index
            .rebuild(RepoId(1), &[(NodeType::Symbol, 1, "parse_config".to_string())])
            .unwrap();
        index
            .rebuild(RepoId(2), &[(NodeType::Symbol, 2, "parse_config".to_string())])
            .unwrap();

        let hits = index.search(RepoId(1), "parse_config", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, 1);
    }
}
