//! `init`: writes a `.codegraph/config.toml` for the given workspace root.

use std::path::Path;

use crate::config::Settings;

pub fn run(path: &Path) {
    if Settings::is_initialized(path) {
        eprintln!("Already initialized: {}", path.display());
        std::process::exit(1);
    }

    match Settings::default().init_config_file(path) {
        Ok(config_path) => {
            println!("Created configuration file at: {}", config_path.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
