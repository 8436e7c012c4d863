//! MCP (Model Context Protocol) server exposing the five external
//! operations from spec.md §6 as tools over stdio, for an embedding
//! application shell (an AI coding assistant) to call directly. No
//! indexing/retrieval logic lives here — every tool marshals its
//! arguments and calls straight into [`crate::ops`].

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorData as McpError, Implementation, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    schemars,
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::indexing::IndexMode;
use crate::ops;
use crate::retrieve::Hints;

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct RepoIndexRequest {
    /// Path to the repository root to index.
    pub repo_path: String,
    /// "full" or "incremental" (default "full").
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct RepoPathRequest {
    pub repo_path: String,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct RepoSearchRequest {
    pub repo_path: String,
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct RepoSnippetRequest {
    pub repo_path: String,
    pub file_path: String,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct RepoContextGetRequest {
    pub repo_path: String,
    pub task: String,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub hint_paths: Vec<String>,
    #[serde(default)]
    pub hint_symbols: Vec<String>,
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"));
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn error_result(message: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(message.into())]))
}

#[derive(Clone)]
pub struct CodeGraphServer {
    settings: Arc<Settings>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CodeGraphServer {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Index a repository, full or incremental")]
    pub async fn repo_index(
        &self,
        Parameters(RepoIndexRequest { repo_path, mode }): Parameters<RepoIndexRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mode = match IndexMode::parse(mode.as_deref().unwrap_or("full")) {
            Ok(m) => m,
            Err(e) => return error_result(e.to_string()),
        };
        let now = crate::utils::get_utc_timestamp() as i64;
        match ops::repo_index(&self.settings, &PathBuf::from(repo_path), mode, now) {
            Ok(summary) => json_result(&summary),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Report whether a repository is indexed, and current counts")]
    pub async fn repo_status(
        &self,
        Parameters(RepoPathRequest { repo_path }): Parameters<RepoPathRequest>,
    ) -> Result<CallToolResult, McpError> {
        match ops::repo_status(&self.settings, &PathBuf::from(repo_path)) {
            Ok(status) => json_result(&status),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Full-text search over an indexed repository")]
    pub async fn repo_search(
        &self,
        Parameters(RepoSearchRequest { repo_path, query, limit }): Parameters<RepoSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        match ops::repo_search(&self.settings, &PathBuf::from(repo_path), &query, limit) {
            Ok(results) => json_result(&results),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Read a clamped, path-safety-checked line range from a file in a repository")]
    pub async fn repo_snippet(
        &self,
        Parameters(RepoSnippetRequest { repo_path, file_path, start_line, end_line }): Parameters<RepoSnippetRequest>,
    ) -> Result<CallToolResult, McpError> {
        match ops::repo_snippet(&PathBuf::from(repo_path), &file_path, start_line, end_line) {
            Ok(snippet) => json_result(&snippet),
            Err(e) => error_result(e.to_string()),
        }
    }

    #[tool(description = "Assemble a task-scoped, budget-bounded context bundle from an indexed repository")]
    pub async fn repo_context_get(
        &self,
        Parameters(RepoContextGetRequest { repo_path, task, budget, hint_paths, hint_symbols }): Parameters<RepoContextGetRequest>,
    ) -> Result<CallToolResult, McpError> {
        let hints = Hints {
            paths: hint_paths,
            symbols: hint_symbols,
            lang: None,
        };
        match ops::repo_context_get(&self.settings, &PathBuf::from(repo_path), &task, budget, hints) {
            Ok(outcome) => json_result(&outcome),
            Err(e) => error_result(e.to_string()),
        }
    }
}

#[tool_handler]
impl ServerHandler for CodeGraphServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "codegraph".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Code Graph Indexing & Retrieval Engine".to_string()),
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Tools: repo_index, repo_status, repo_search, repo_snippet, repo_context_get. \
                Call repo_index before anything else; repo_context_get returns \
                {error, suggestion: \"repo_index\"} for an unindexed repo rather than failing."
                    .to_string(),
            ),
        }
    }
}
