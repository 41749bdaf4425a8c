//! Indexing configuration.
//!
//! The config file is plain JSON next to the rest of the data dir. Missing
//! keys fall back to defaults, and a missing or unparseable file yields the
//! default config rather than an error; validation beyond shape is the
//! caller's concern.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Roots to crawl. Non-existent entries are skipped at crawl time.
    pub folders_to_index: Vec<PathBuf>,
    /// Case-insensitive directory/file names to skip anywhere under a root.
    pub exclude_patterns: Vec<String>,
    /// Size ceiling for ordinary files; document formats get a larger one.
    pub max_file_size_kb: u64,
    /// Sync shell history into the activity logs before indexing.
    pub log_terminal_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folders_to_index: Vec::new(),
            exclude_patterns: vec![
                ".git".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
                ".venv".to_string(),
            ],
            max_file_size_kb: 512,
            log_terminal_history: true,
        }
    }
}

impl Config {
    /// Load from `path`. A missing or invalid file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "invalid config file, using defaults");
                Self::default()
            }
        }
    }

    /// Write as pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/config.json"));
        assert_eq!(config.max_file_size_kb, 512);
        assert!(config.log_terminal_history);
        assert!(config.exclude_patterns.contains(&".git".to_string()));
    }

    #[test]
    fn invalid_json_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = Config::load(&path);
        assert_eq!(config.max_file_size_kb, 512);
    }

    #[test]
    fn partial_file_fills_missing_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"max_file_size_kb": 64}"#).unwrap();
        let config = Config::load(&path);
        assert_eq!(config.max_file_size_kb, 64);
        assert!(config.log_terminal_history);
    }

    #[test]
    fn save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sub").join("config.json");
        let mut config = Config::default();
        config.folders_to_index.push(PathBuf::from("/notes"));
        config.log_terminal_history = false;
        config.save(&path).unwrap();
        let loaded = Config::load(&path);
        assert_eq!(loaded.folders_to_index, vec![PathBuf::from("/notes")]);
        assert!(!loaded.log_terminal_history);
    }
}
