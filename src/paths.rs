//! Resolution of the on-disk data layout.
//!
//! Everything the crate persists lives under one root: activity logs,
//! the crawl snapshot, and the search index. The root comes from the
//! `LODESEARCH_DATA` environment variable when set, otherwise
//! `~/LodeSearch`. Tests construct [`DataPaths::new`] against a tempdir
//! so nothing ambient leaks in.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "LODESEARCH_DATA";

const DEFAULT_DIR_NAME: &str = "LodeSearch";
const SNAPSHOT_FILE: &str = "file_metadata.json";

/// Handle on the data root and its well-known subpaths.
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve from the environment, falling back to `~/LodeSearch`.
    pub fn from_env() -> Self {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Self::new(PathBuf::from(dir));
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(DEFAULT_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-device activity logs.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Flat snapshot of the last crawl.
    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join("file_index_data").join(SNAPSHOT_FILE)
    }

    /// Full-text index storage, local to the device.
    pub fn index_dir(&self) -> PathBuf {
        self.root.join("search_index")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Create the root and its subdirectories if missing.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.logs_dir())?;
        if let Some(parent) = self.snapshot_path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(self.index_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn subpaths_hang_off_the_root() {
        let paths = DataPaths::new("/data/ls");
        assert_eq!(paths.logs_dir(), PathBuf::from("/data/ls/logs"));
        assert_eq!(
            paths.snapshot_path(),
            PathBuf::from("/data/ls/file_index_data/file_metadata.json")
        );
        assert_eq!(paths.index_dir(), PathBuf::from("/data/ls/search_index"));
    }

    #[test]
    fn ensure_creates_layout() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path().join("data"));
        paths.ensure().unwrap();
        assert!(paths.logs_dir().is_dir());
        assert!(paths.index_dir().is_dir());
        assert!(paths.snapshot_path().parent().unwrap().is_dir());
    }
}
