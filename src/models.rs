//! Core data types shared by the crawl, index, and search layers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One file as seen by the crawler. The snapshot on disk is a JSON array of
/// these, overwritten wholesale on every indexing pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Canonical absolute path; doubles as the document id.
    pub path: PathBuf,
    /// Modification time in epoch seconds.
    #[serde(default)]
    pub mtime: f64,
    /// File size in bytes at crawl time.
    #[serde(default)]
    pub size: u64,
}

/// One shell command as persisted in the activity logs. Produced and owned
/// by the activity source; the index builder consumes it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRecord {
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub cwd: String,
}

impl CommandRecord {
    pub const TYPE_COMMAND: &'static str = "command";

    pub fn new(timestamp: String, command: String, cwd: String) -> Self {
        Self {
            record_type: Self::TYPE_COMMAND.to_string(),
            timestamp,
            command,
            cwd,
        }
    }

    pub fn is_command(&self) -> bool {
        self.record_type == Self::TYPE_COMMAND
    }
}

/// Kind of an indexed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    File,
    Command,
}

impl IndexKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexKind::File => "file",
            IndexKind::Command => "command",
        }
    }

    /// Stored kinds other than "command" read back as files.
    pub fn from_stored(raw: &str) -> Self {
        if raw == "command" {
            IndexKind::Command
        } else {
            IndexKind::File
        }
    }
}

/// A ranked hit returned by the query engine.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// File path for file documents, `command:<ts>:<n>` for commands.
    pub id: String,
    pub snippet: String,
    pub kind: IndexKind,
    /// Full stored content for command hits, for clipboard use. `None` for files.
    pub copyable_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_storage() {
        assert_eq!(IndexKind::from_stored("file"), IndexKind::File);
        assert_eq!(IndexKind::from_stored("command"), IndexKind::Command);
        assert_eq!(IndexKind::from_stored("garbage"), IndexKind::File);
    }

    #[test]
    fn command_record_parses_log_entry() {
        let raw = r#"{"type":"command","timestamp":"2026-01-05T09:12:00","command":"git status","cwd":"/home/x"}"#;
        let rec: CommandRecord = serde_json::from_str(raw).unwrap();
        assert!(rec.is_command());
        assert_eq!(rec.command, "git status");
    }

    #[test]
    fn command_record_tolerates_missing_fields() {
        let rec: CommandRecord = serde_json::from_str("{}").unwrap();
        assert!(!rec.is_command());
        assert!(rec.command.is_empty());
    }
}
