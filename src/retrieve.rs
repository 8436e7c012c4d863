//! Retriever: task + hints + budget -> `ContextBundle` (spec.md §4.7).
//!
//! Pipeline: seed a focus set from hints and full-text search, expand one
//! hop in both directions over the Edge graph (capped), extract snippets
//! from disk under a character budget, then assemble the bundle. Grounded
//! on the teacher's `retrieve.rs` `QueryContext` style (resolve-then-report,
//! accumulating notes/warnings) but built against this crate's own
//! `GraphStore`/`SearchIndex`, not the teacher's symbol/relationship model.

use crate::error::{RetrieveError, RetrieveResult};
use crate::hash::hash_str;
use crate::storage::{EdgeRow, GraphStore, NodeRef, SearchHit, SearchIndex};
use crate::types::{Direction, FileId, NodeType, RepoId, SymbolId};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_BUDGET: i64 = 8_000;
pub const MIN_BUDGET: i64 = 1_000;
pub const MAX_BUDGET: i64 = 32_000;

const EXPANSION_DEPTH: u32 = 1;
const MAX_SUBGRAPH_NODES: usize = 128;
const MAX_SUBGRAPH_EDGES: usize = 256;
const FTS_LIMIT: usize = 32;
const STOPWORD_MAX_LEN: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct Hints {
    pub paths: Vec<String>,
    pub symbols: Vec<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FocusItem {
    pub node_type: NodeType,
    pub node_id: i64,
    pub name: String,
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub text: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubgraphNode {
    pub node_type: NodeType,
    pub node_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubgraphEdge {
    pub src_type: NodeType,
    pub src_id: i64,
    pub rel: String,
    pub dst_type: NodeType,
    pub dst_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subgraph {
    pub nodes: Vec<SubgraphNode>,
    pub edges: Vec<SubgraphEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Limits {
    pub budget: i64,
    pub used_estimate: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoRef {
    pub root: String,
    pub rev: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    pub repo: RepoRef,
    pub intent: String,
    pub focus: Vec<FocusItem>,
    pub snippets: Vec<Snippet>,
    pub subgraph: Subgraph,
    pub notes: Vec<String>,
    pub limits: Limits,
}

/// Clamps a caller-supplied budget into `[MIN_BUDGET, MAX_BUDGET]`, per
/// spec.md §4.7.
pub fn clamp_budget(budget: Option<i64>) -> i64 {
    budget.unwrap_or(DEFAULT_BUDGET).clamp(MIN_BUDGET, MAX_BUDGET)
}

/// Splits on non-alphanumeric characters, lowercases, and drops tokens of
/// length <= 2 (spec.md §4.7 step 1c).
fn tokenize_task(task: &str) -> Vec<String> {
    task.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .filter(|s| s.len() > STOPWORD_MAX_LEN)
        .collect()
}

pub struct Retriever<'a> {
    store: &'a GraphStore,
    search: &'a SearchIndex,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a GraphStore, search: &'a SearchIndex) -> Self {
        Self { store, search }
    }

    pub fn get_context(
        &self,
        repo_root: &Path,
        repo_id: RepoId,
        task: &str,
        budget: Option<i64>,
        hints: &Hints,
    ) -> RetrieveResult<ContextBundle> {
        let budget = clamp_budget(budget);
        let mut notes = Vec::new();

        let mut focus: Vec<FocusItem> = Vec::new();
        let mut seen_nodes: HashSet<NodeRef> = HashSet::new();

        // 1a. hint symbols, by short name or fq_name.
        for name in &hints.symbols {
            let matches = self.store.symbol_find_by_name(repo_id, name)?;
            if matches.is_empty() {
                notes.push(format!("hint symbol '{name}' did not match any symbol"));
            }
            for sym in matches {
                let node = NodeRef {
                    node_type: NodeType::Symbol,
                    id: sym.id.0,
                };
                if seen_nodes.insert(node) {
                    focus.push(FocusItem {
                        node_type: NodeType::Symbol,
                        node_id: sym.id.0,
                        name: sym.fq_name.clone().unwrap_or_else(|| sym.name.clone()),
                        path: String::new(),
                        reason: format!("hint:symbol:{name}"),
                    });
                }
            }
        }

        // 1b. hint paths.
        for path in &hints.paths {
            if let Some(file) = self.store.file_find_by_path(repo_id, path)? {
                let node = NodeRef {
                    node_type: NodeType::File,
                    id: file.id.0,
                };
                if seen_nodes.insert(node) {
                    focus.push(FocusItem {
                        node_type: NodeType::File,
                        node_id: file.id.0,
                        name: file.path.clone(),
                        path: file.path.clone(),
                        reason: format!("hint:path:{path}"),
                    });
                }
            } else {
                notes.push(format!("hint path '{path}' did not match any file"));
            }
        }

        // 1c. FTS over the tokenized task. Ties break by score desc then
        // fq_name asc.
        let tokens = tokenize_task(task);
        if !tokens.is_empty() {
            let query = tokens.join(" ");
            let hits = self.search.search(repo_id, &query, FTS_LIMIT)?;
            let mut resolved: Vec<(SearchHit, String, String)> = Vec::with_capacity(hits.len());
            for hit in hits {
                let node = NodeRef {
                    node_type: hit.entity_type,
                    id: hit.entity_id,
                };
                let (name, path) = self.describe_node(node)?;
                resolved.push((hit, name, path));
            }
            resolved.sort_by(|(a, name_a, _), (b, name_b, _)| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| name_a.cmp(name_b))
            });
            for (hit, name, path) in resolved {
                let node = NodeRef {
                    node_type: hit.entity_type,
                    id: hit.entity_id,
                };
                if !seen_nodes.insert(node) {
                    continue;
                }
                focus.push(FocusItem {
                    node_type: node.node_type,
                    node_id: node.id,
                    name,
                    path,
                    reason: format!("fts:{:.4}", hit.score),
                });
            }
        }

        // 2. Expansion: getNeighbours(depth=1, both) from every focus node,
        // union results, cap at 128 nodes / 256 edges.
        let mut subgraph_nodes: Vec<SubgraphNode> = Vec::new();
        let mut subgraph_edges: Vec<SubgraphEdge> = Vec::new();
        let mut node_seen: HashSet<NodeRef> = HashSet::new();
        let mut edge_seen: HashSet<i64> = HashSet::new();

        'outer: for item in &focus {
            let seed = NodeRef {
                node_type: item.node_type,
                id: item.node_id,
            };
            let result = self
                .store
                .get_neighbours(repo_id, seed, EXPANSION_DEPTH, Direction::Both)?;

            for node in result.nodes {
                if subgraph_nodes.len() >= MAX_SUBGRAPH_NODES {
                    notes.push(format!(
                        "subgraph capped at {MAX_SUBGRAPH_NODES} nodes; remaining neighbours dropped"
                    ));
                    break 'outer;
                }
                if node_seen.insert(node) {
                    subgraph_nodes.push(SubgraphNode {
                        node_type: node.node_type,
                        node_id: node.id,
                    });
                }
            }
            for edge in result.edges {
                if subgraph_edges.len() >= MAX_SUBGRAPH_EDGES {
                    notes.push(format!(
                        "subgraph capped at {MAX_SUBGRAPH_EDGES} edges; remaining edges dropped"
                    ));
                    break 'outer;
                }
                if edge_seen.insert(edge.id.0) {
                    subgraph_edges.push(edge_to_subgraph(&edge));
                }
            }
        }

        // 3. Snippet extraction from disk, budget-stopped.
        let mut snippets = Vec::new();
        let mut used_chars: i64 = 0;
        for item in &focus {
            if item.node_type != NodeType::Symbol {
                continue;
            }
            if (used_chars as f64) * 0.25 >= budget as f64 {
                break;
            }
            let Some(symbol) = self.store.symbol_find_by_id(SymbolId(item.node_id))? else {
                continue;
            };
            let Some(file) = self.store.file_by_id(symbol.file_id)? else {
                continue;
            };
            match self.extract_snippet(repo_root, &file.path, symbol.range.start_line, symbol.range.end_line) {
                Ok((text, start, end, total)) => {
                    if end > total || start < 1 {
                        notes.push(format!(
                            "{}: symbol range clamped to file bounds [1..{total}]",
                            file.path
                        ));
                    }
                    used_chars += text.len() as i64;
                    snippets.push(Snippet {
                        path: file.path.clone(),
                        start_line: start,
                        end_line: end,
                        sha256: hash_str(&text),
                        text,
                    });
                }
                Err(e) => {
                    notes.push(format!("{}: failed to read snippet: {e}", file.path));
                }
            }
        }

        let used_estimate = (used_chars as f64 * 0.25).round() as i64;

        Ok(ContextBundle {
            repo: RepoRef {
                root: repo_root.to_string_lossy().to_string(),
                rev: None,
            },
            intent: task.to_string(),
            focus,
            snippets,
            subgraph: Subgraph {
                nodes: subgraph_nodes,
                edges: subgraph_edges,
            },
            notes,
            limits: Limits {
                budget,
                used_estimate,
            },
        })
    }

    fn describe_node(&self, node: NodeRef) -> RetrieveResult<(String, String)> {
        match node.node_type {
            NodeType::Symbol => {
                if let Some(sym) = self.store.symbol_find_by_id(SymbolId(node.id))? {
                    let path = self
                        .store
                        .file_by_id(sym.file_id)?
                        .map(|f| f.path)
                        .unwrap_or_default();
                    Ok((sym.fq_name.unwrap_or(sym.name), path))
                } else {
                    Ok((String::new(), String::new()))
                }
            }
            NodeType::File => {
                if let Some(file) = self.store.file_by_id(FileId(node.id))? {
                    Ok((file.path.clone(), file.path))
                } else {
                    Ok((String::new(), String::new()))
                }
            }
            NodeType::Module => Ok((String::new(), String::new())),
        }
    }

    /// Reads `path` (repo-relative) under `repo_root`, clamps
    /// `[start_line..end_line]` to the file's actual line count, and returns
    /// `(text, clamped_start, clamped_end, total_lines)`.
    fn extract_snippet(
        &self,
        repo_root: &Path,
        path: &str,
        start_line: u32,
        end_line: u32,
    ) -> std::io::Result<(String, u32, u32, u32)> {
        let full_path = repo_root.join(path);
        let contents = std::fs::read_to_string(full_path)?;
        let lines: Vec<&str> = contents.lines().collect();
        let total = lines.len() as u32;

        let start = start_line.max(1).min(total.max(1));
        let end = end_line.max(start).min(total.max(1));

        let text = lines
            .get((start.saturating_sub(1)) as usize..end as usize)
            .unwrap_or(&[])
            .join("\n");

        Ok((text, start, end, total))
    }
}

fn edge_to_subgraph(edge: &EdgeRow) -> SubgraphEdge {
    SubgraphEdge {
        src_type: edge.src_type,
        src_id: edge.src_id,
        rel: edge.rel.clone(),
        dst_type: edge.dst_type,
        dst_id: edge.dst_id,
    }
}

/// The only non-exceptional failure mode of `repo_context_get` (spec.md
/// §4.7): the repo has never been indexed.
pub fn not_indexed_error(repo_path: &Path) -> RetrieveError {
    RetrieveError::NotIndexed {
        path: repo_path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_clamps_to_bounds() {
        assert_eq!(clamp_budget(None), DEFAULT_BUDGET);
        assert_eq!(clamp_budget(Some(1)), MIN_BUDGET);
        assert_eq!(clamp_budget(Some(1_000_000)), MAX_BUDGET);
        assert_eq!(clamp_budget(Some(5_000)), 5_000);
    }

    #[test]
    fn tokenize_drops_short_stopwords_and_lowercases() {
        let tokens = tokenize_task("How do I fix the Auth bug?");
        assert_eq!(tokens, vec!["how", "fix", "the", "auth", "bug"]);
    }
}
