//! Layered configuration: built-in defaults, overridden by an optional TOML
//! file, overridden by `CG_`-prefixed environment variables. Modeled on the
//! teacher's `figment` layering (`Serialized::defaults` -> `Toml::file` ->
//! `Env::prefixed`), with double-underscore env keys mapping to dotted
//! nesting (e.g. `CG_INDEXING__THREADS=4` -> `indexing.threads`).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ErrorContext, IndexError, IndexResult};

pub const CONFIG_DIR_NAME: &str = ".codegraph";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// rayon thread pool size for per-file parsing. 0 means `num_cpus::get()`.
    pub threads: usize,
    /// Additional directory names to prune beyond the built-in list.
    pub ignore_dirs: Vec<String>,
    /// Per-language enable switches; a language absent from the map is enabled.
    pub languages: HashMap<String, bool>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            ignore_dirs: Vec::new(),
            languages: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Maximum nodes/edges the retriever will return in one subgraph.
    pub max_nodes: usize,
    pub max_edges: usize,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            max_nodes: 128,
            max_edges: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter applied when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub version: u32,
    /// Where the duckdb database and tantivy index live, relative to the
    /// workspace config directory unless absolute.
    pub index_path: PathBuf,
    pub indexing: IndexingConfig,
    pub mcp: McpConfig,
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            index_path: PathBuf::from("index"),
            indexing: IndexingConfig::default(),
            mcp: McpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Loads settings by walking up from the current directory to find a
    /// workspace config directory, then layering defaults -> file -> env.
    pub fn load() -> IndexResult<Self> {
        let cwd = std::env::current_dir().context("reading current directory")?;
        Self::load_from(&cwd)
    }

    pub fn load_from(start_dir: &Path) -> IndexResult<Self> {
        let config_path = Self::find_workspace_config(start_dir);

        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = &config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("CG_").split("__"));

        figment
            .extract()
            .map_err(|e| IndexError::General(format!("failed to load configuration: {e}")))
    }

    /// Ancestor search for a `.codegraph/config.toml`, teacher's
    /// `find_workspace_config` pattern.
    pub fn find_workspace_config(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = Some(start_dir.to_path_buf());
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent().map(Path::to_path_buf);
        }
        None
    }

    pub fn workspace_root(start_dir: &Path) -> PathBuf {
        match Self::find_workspace_config(start_dir) {
            Some(path) => path
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start_dir.to_path_buf()),
            None => start_dir.to_path_buf(),
        }
    }

    pub fn is_initialized(start_dir: &Path) -> bool {
        Self::find_workspace_config(start_dir).is_some()
    }

    /// Writes this config to `<root>/.codegraph/config.toml`, creating the
    /// directory if needed.
    pub fn init_config_file(&self, root: &Path) -> IndexResult<PathBuf> {
        let dir = root.join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&dir).with_path(&dir)?;
        let path = dir.join(CONFIG_FILE_NAME);
        self.save(&path)?;
        Ok(path)
    }

    pub fn save(&self, path: &Path) -> IndexResult<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| IndexError::General(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, text).with_path(path)
    }

    /// Resolves `index_path` against the workspace root if relative.
    pub fn resolved_index_path(&self, root: &Path) -> PathBuf {
        if self.index_path.is_absolute() {
            self.index_path.clone()
        } else {
            root.join(CONFIG_DIR_NAME).join(&self.index_path)
        }
    }

    pub fn thread_count(&self) -> usize {
        if self.indexing.threads == 0 {
            num_cpus::get()
        } else {
            self.indexing.threads
        }
    }

    pub fn language_enabled(&self, language: &str) -> bool {
        self.indexing
            .languages
            .get(language)
            .copied()
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_round_trip_through_figment() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(dir.path()).unwrap();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.mcp.max_nodes, 128);
    }

    #[test]
    fn finds_ancestor_config() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let settings = Settings::default();
        settings.init_config_file(root.path()).unwrap();

        let found = Settings::find_workspace_config(&nested);
        assert_eq!(
            found,
            Some(root.path().join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        );
        assert!(Settings::is_initialized(&nested));
    }

    #[test]
    fn env_override_takes_precedence() {
        let dir = TempDir::new().unwrap();
        // SAFETY: test-only process-local env mutation, no concurrent access.
        unsafe {
            std::env::set_var("CG_INDEXING__THREADS", "4");
        }
        let settings = Settings::load_from(dir.path()).unwrap();
        unsafe {
            std::env::remove_var("CG_INDEXING__THREADS");
        }
        assert_eq!(settings.indexing.threads, 4);
    }

    #[test]
    fn language_enabled_defaults_true() {
        let settings = Settings::default();
        assert!(settings.language_enabled("rust"));
    }
}
