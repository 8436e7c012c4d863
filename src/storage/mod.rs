//! Persistence layer: a transactional graph store (DuckDB) for entities and
//! relationships, and a derived full-text index (tantivy) for search.

pub mod graph;
pub mod search;

pub use graph::{EdgeRow, FileRecord, GraphStore, ModuleRecord, NewEdge, NewSymbol, NeighbourResult, NodeRef, RepoRecord, SymbolRow};
pub use search::{SearchHit, SearchIndex};
