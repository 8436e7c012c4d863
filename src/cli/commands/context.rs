//! `context`: assembles a task-scoped, budget-bounded context bundle.

use std::path::Path;

use crate::config::Settings;
use crate::ops;
use crate::retrieve::Hints;

#[allow(clippy::too_many_arguments)]
pub fn run(
    settings: &Settings,
    path: &Path,
    task: &str,
    budget: Option<i64>,
    hint_paths: Vec<String>,
    hint_symbols: Vec<String>,
) {
    let hints = Hints {
        paths: hint_paths,
        symbols: hint_symbols,
        lang: None,
    };

    match ops::repo_context_get(settings, path, task, budget, hints) {
        Ok(outcome) => println!("{}", serde_json::to_string_pretty(&outcome).unwrap()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
