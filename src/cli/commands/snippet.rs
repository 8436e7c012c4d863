//! `snippet`: reads a clamped, path-safety-checked line range from a file.

use std::path::Path;

use crate::ops;

pub fn run(path: &Path, file: &str, start_line: Option<u32>, end_line: Option<u32>) {
    match ops::repo_snippet(path, file, start_line, end_line) {
        Ok(snippet) => println!("{}", serde_json::to_string_pretty(&snippet).unwrap()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
