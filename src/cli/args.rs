//! CLI surface: a thin `clap` derive layer mapping 1:1 onto the external
//! operations in spec.md §6, plus `init` for bootstrapping a workspace.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "codegraph", version, about = "Multi-language source-code indexing and retrieval engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (can be repeated: -v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initializes a `.codegraph/config.toml` in the given directory.
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Indexes a repository (full or incremental).
    Index {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// "full" or "incremental".
        #[arg(long, default_value = "full")]
        mode: String,
    },

    /// Reports whether a repository has been indexed, and current counts.
    Status {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Full-text search over an indexed repository.
    Search {
        #[arg(default_value = ".")]
        path: PathBuf,

        query: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Reads a clamped line range from a file within an indexed repository.
    Snippet {
        #[arg(default_value = ".")]
        path: PathBuf,

        file: String,

        #[arg(long)]
        start_line: Option<u32>,

        #[arg(long)]
        end_line: Option<u32>,
    },

    /// Assembles a task-scoped, budget-bounded context bundle.
    Context {
        #[arg(default_value = ".")]
        path: PathBuf,

        task: String,

        #[arg(long)]
        budget: Option<i64>,

        /// Repo-relative paths to seed the focus set with.
        #[arg(long = "hint-path")]
        hint_paths: Vec<String>,

        /// Symbol short or fully-qualified names to seed the focus set with.
        #[arg(long = "hint-symbol")]
        hint_symbols: Vec<String>,
    },

    /// Runs the MCP server over stdio, exposing the five operations above
    /// as tools for an embedding application shell.
    Serve {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}
