//! `index`: runs a full or incremental indexing pass and prints the summary.

use std::path::Path;

use crate::config::Settings;
use crate::indexing::IndexMode;
use crate::ops;

pub fn run(settings: &Settings, path: &Path, mode: &str) {
    let mode = match IndexMode::parse(mode) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let now = crate::utils::get_utc_timestamp() as i64;
    match ops::repo_index(settings, path, mode, now) {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary).unwrap());
            for warning in &summary.warnings {
                eprintln!("warning: {warning}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
