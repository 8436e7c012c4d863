//! `serve`: runs the MCP server over stdio.

use std::path::Path;

use rmcp::{transport::stdio, ServiceExt};

use crate::config::Settings;
use crate::mcp::CodeGraphServer;

pub async fn run(settings: Settings, path: &Path) {
    eprintln!("Starting MCP server on stdio transport for {}", path.display());

    let server = CodeGraphServer::new(settings);
    let service = match server.serve(stdio()).await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to start MCP server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = service.waiting().await {
        eprintln!("MCP server error: {e}");
        std::process::exit(1);
    }
}
