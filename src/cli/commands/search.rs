//! `search`: BM25 full-text search over an indexed repo.

use std::path::Path;

use crate::config::Settings;
use crate::ops;

pub fn run(settings: &Settings, path: &Path, query: &str, limit: usize) {
    match ops::repo_search(settings, path, query, limit) {
        Ok(results) => println!("{}", serde_json::to_string_pretty(&results).unwrap()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
