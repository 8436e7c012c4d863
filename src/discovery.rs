//! File Discovery: walks a repo root and yields `DiscoveredFile`s filtered
//! by language extension, in deterministic (sorted) order. Grounded on the
//! teacher's `indexing/walker.rs` `FileWalker` (`ignore::WalkBuilder` with
//! gitignore/global-gitignore/exclude all enabled), extended with an
//! explicit prune list and a final lexicographic sort per SPEC_FULL.md §4.2.

use crate::config::Settings;
use crate::types::Language;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Directories pruned unconditionally, in addition to whatever a repo's own
/// `.gitignore` excludes.
const PRUNED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "__pycache__",
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredFile {
    /// Repo-relative path, forward-slash separated.
    pub path: String,
    pub absolute_path: PathBuf,
    pub lang: Language,
    pub mtime: i64,
    pub size: u64,
}

pub struct FileDiscovery<'a> {
    settings: &'a Settings,
}

impl<'a> FileDiscovery<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Walks `root`, returning discovered files sorted lexicographically by
    /// repo-relative path so downstream IDs are stable run-to-run.
    pub fn discover(&self, root: &Path) -> Vec<DiscoveredFile> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .max_depth(None)
            .require_git(false);

        let mut overrides = OverrideBuilder::new(root);
        for dir in PRUNED_DIRS {
            let _ = overrides.add(&format!("!{dir}/"));
            let _ = overrides.add(&format!("!**/{dir}/"));
        }
        for pattern in &self.settings.indexing.ignore_dirs {
            let _ = overrides.add(&format!("!{pattern}"));
            let _ = overrides.add(&format!("!**/{pattern}"));
        }
        if let Ok(built) = overrides.build() {
            builder.overrides(built);
        }

        let mut files: Vec<DiscoveredFile> = builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|entry| {
                let abs = entry.path();
                let rel = abs.strip_prefix(root).ok()?;
                let ext = abs.extension()?.to_str()?;
                let lang = Language::from_extension(ext)?;
                if !self.settings.language_enabled(lang.as_str()) {
                    return None;
                }
                let meta = entry.metadata().ok()?;
                let mtime = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                Some(DiscoveredFile {
                    path: rel.to_string_lossy().replace('\\', "/"),
                    absolute_path: abs.to_path_buf(),
                    lang,
                    mtime,
                    size: meta.len(),
                })
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn discovers_and_sorts_supported_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.rs"), "fn main() {}").unwrap();
        std::fs::write(dir.path().join("a.py"), "def f(): pass").unwrap();
        std::fs::write(dir.path().join("README.md"), "# hi").unwrap();

        let settings = settings();
        let discovery = FileDiscovery::new(&settings);
        let files = discovery.discover(dir.path());

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "a.py");
        assert_eq!(files[1].path, "b.rs");
    }

    #[test]
    fn prunes_built_in_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/vendor.js"), "x").unwrap();
        std::fs::write(dir.path().join("main.js"), "x").unwrap();

        let settings = settings();
        let discovery = FileDiscovery::new(&settings);
        let files = discovery.discover(dir.path());

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "main.js");
    }

    #[test]
    fn respects_gitignore() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "ignored.rs\n").unwrap();
        std::fs::write(dir.path().join("ignored.rs"), "x").unwrap();
        std::fs::write(dir.path().join("kept.rs"), "x").unwrap();

        let settings = settings();
        let discovery = FileDiscovery::new(&settings);
        let files = discovery.discover(dir.path());

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "kept.rs");
    }
}
