//! `status`: reports whether a repo is indexed, and current counts.

use std::path::Path;

use crate::config::Settings;
use crate::ops;

pub fn run(settings: &Settings, path: &Path) {
    match ops::repo_status(settings, path) {
        Ok(status) => println!("{}", serde_json::to_string_pretty(&status).unwrap()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
