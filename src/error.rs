//! Structured error types for the indexing and retrieval engine.
//!
//! Three failure kinds are modelled as distinct enums: input errors surface
//! directly to callers, per-file processing errors are contained by the
//! indexer and accumulate as warnings, and storage errors are fatal and
//! abort the run with prior commits left durable.

use crate::types::{FileId, SymbolId};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for indexing operations.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Path '{path}' escapes repo root '{root}'")]
    PathTraversal { path: PathBuf, root: PathBuf },

    #[error("Repo '{path}' is not indexed yet")]
    NotIndexed { path: PathBuf },

    #[error("Repo '{path}' is already being indexed")]
    IndexBusy { path: PathBuf },

    #[error("Unsupported file extension '{extension}' for file '{path}'")]
    UnsupportedFileType { path: PathBuf, extension: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid mode '{0}', expected 'full' or 'incremental'")]
    InvalidMode(String),

    #[error("Invalid budget {0}, must be positive")]
    InvalidBudget(i64),

    #[error("File ID {id} not found")]
    FileNotFound { id: FileId },

    #[error("Symbol ID {id} not found")]
    SymbolNotFound { id: SymbolId },

    #[error("{0}")]
    General(String),
}

/// Per-file processing error. Contained by the indexer: one diagnostic
/// appended to `IndexSummary::warnings`, the file counted under
/// `files_skipped`, the run continues. See spec.md §7.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Failed to initialize {language} grammar: {reason}")]
    GrammarInit { language: String, reason: String },

    #[error("tree-sitter failed to produce a syntax tree for '{path}'")]
    NoTree { path: String },

    #[error("Invalid UTF-8 in '{path}'")]
    InvalidUtf8 { path: String },

    #[error("Recursion depth exceeded while walking '{path}'")]
    DepthExceeded { path: String },
}

/// Fatal store errors: transaction failures, schema mismatches. These
/// propagate and abort the indexing run.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("duckdb error: {0}")]
    Duckdb(#[from] duckdb::Error),

    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("tantivy query parse error: {0}")]
    QueryParse(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("internal lock poisoned")]
    LockPoisoned,

    #[error("schema migration failed: {0}")]
    Migration(String),
}

/// Retrieval-specific errors. The only non-exceptional failure mode per
/// spec.md §4.7 is the `NotIndexed` case, which callers turn into
/// `{error, suggestion: "repo_index"}` rather than propagating as an error.
#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("repo '{path}' is not indexed")]
    NotIndexed { path: PathBuf },

    #[error("invalid budget {0}")]
    InvalidBudget(i64),
}

#[derive(Error, Debug)]
pub enum McpError {
    #[error("failed to start MCP server: {reason}")]
    ServerInit { reason: String },

    #[error("invalid tool arguments: {reason}")]
    InvalidArguments { reason: String },

    #[error(transparent)]
    Index(#[from] IndexError),
}

pub type IndexResult<T> = Result<T, IndexError>;
pub type ParseFnResult<T> = Result<T, ParseError>;
pub type StorageResult<T> = Result<T, StorageError>;
pub type RetrieveResult<T> = Result<T, RetrieveError>;
pub type McpResult<T> = Result<T, McpError>;

/// Attaches operation/path context to a foreign error, converting it into
/// an `IndexError`.
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> IndexResult<T>;
    fn with_path(self, path: &std::path::Path) -> IndexResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> IndexResult<T> {
        self.map_err(|e| IndexError::General(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> IndexResult<T> {
        self.map_err(|e| IndexError::General(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_foreign_error() {
        let res: Result<(), std::num::ParseIntError> = "abc".parse::<i32>().map(|_| ());
        let wrapped = res.context("parsing count");
        assert!(matches!(wrapped, Err(IndexError::General(_))));
    }
}
