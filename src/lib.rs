//! Multi-language source-code indexing and retrieval engine.
//!
//! Core pipeline: [`discovery`] walks a repo, [`hash`] content-addresses its
//! files, [`parsing`] turns source into [`parsing::ParseResult`]s via a
//! per-language grammar registry, [`indexing`] applies those into the
//! [`storage`] graph store and search index, and [`retrieve`] answers
//! task-scoped context queries against the result. [`ops`] is the thin
//! façade both [`cli`] and [`mcp`] call into.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod hash;
pub mod indexing;
pub mod logging;
pub mod mcp;
pub mod ops;
pub mod parsing;
pub mod retrieve;
pub mod storage;
pub mod types;
pub mod utils;

pub use config::Settings;
pub use error::{IndexError, IndexResult, McpError, McpResult, ParseError, RetrieveError, RetrieveResult, StorageError, StorageResult};
pub use indexing::{IndexMode, IndexSummary, Indexer};
pub use ops::{repo_context_get, repo_index, repo_search, repo_snippet, repo_status, ContextOutcome, RepoStatus, SearchResultItem, SnippetResult};
pub use retrieve::{ContextBundle, Hints, Retriever};
pub use storage::{GraphStore, SearchIndex};
pub use types::*;
