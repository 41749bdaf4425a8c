//! Activity source adapter: shell-command history.
//!
//! Two operations feed the index builder. [`sync_history`] reads the raw
//! shell history sources and appends previously unseen commands to the
//! current device/day log; prior entries are preserved verbatim.
//! [`load_commands`] aggregates every persisted log into one list.
//! Per-shell format quirks (zsh extended-history prefixes, the PSReadLine
//! location on Windows) stay inside this module.

use anyhow::Result;
use chrono::Local;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::models::CommandRecord;

const LOG_FILE_PREFIX: &str = "device_";
/// History lines longer than this are noise (pasted blobs), not commands.
const MAX_COMMAND_LEN: usize = 2000;

/// Read shell history files and append new commands to the device log.
/// Returns the number of entries appended. Deduplicates by normalized
/// command text against everything already in that log.
pub fn sync_history(logs_dir: &Path) -> Result<usize> {
    let log_path = device_log_path(logs_dir);
    let mut seen = existing_commands(&log_path);

    let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut new_entries = Vec::new();
    for history_path in shell_history_paths() {
        for line in read_lossy_lines(&history_path) {
            let command = normalize_history_line(&line);
            if command.is_empty() || command.len() > MAX_COMMAND_LEN {
                continue;
            }
            if !seen.insert(command.clone()) {
                continue;
            }
            new_entries.push(CommandRecord::new(
                timestamp.clone(),
                command,
                cwd.clone(),
            ));
        }
    }

    if new_entries.is_empty() {
        return Ok(0);
    }

    std::fs::create_dir_all(logs_dir)?;
    // Prior entries are carried over untouched; only new ones are appended.
    let mut all = read_log_values(&log_path);
    for entry in &new_entries {
        all.push(serde_json::to_value(entry)?);
    }
    std::fs::write(&log_path, serde_json::to_string_pretty(&all)?)?;
    Ok(new_entries.len())
}

/// Aggregate all persisted activity logs into one command list. A missing
/// logs dir or an unparseable log file contributes nothing.
pub fn load_commands(logs_dir: &Path) -> Vec<CommandRecord> {
    let entries = match std::fs::read_dir(logs_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut log_files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(".json"))
                .unwrap_or(false)
        })
        .collect();
    log_files.sort();

    let mut commands = Vec::new();
    for path in log_files {
        for value in read_log_values(&path) {
            if let Ok(record) = serde_json::from_value::<CommandRecord>(value) {
                if record.is_command() {
                    commands.push(record);
                }
            }
        }
    }
    commands
}

/// Path of today's log for this device: `device_<hostname>_<date>.json`.
fn device_log_path(logs_dir: &Path) -> PathBuf {
    let date = Local::now().format("%Y-%m-%d");
    logs_dir.join(format!("device_{}_{}.json", hostname(), date))
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Shell history files to pull from, in dedup order.
fn shell_history_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".zsh_history"));
        paths.push(home.join(".bash_history"));
    }
    if let Ok(appdata) = std::env::var("APPDATA") {
        paths.push(
            PathBuf::from(appdata)
                .join("Microsoft")
                .join("Windows")
                .join("PowerShell")
                .join("PSReadLine")
                .join("ConsoleHost_history.txt"),
        );
    }
    paths.into_iter().filter(|p| p.exists()).collect()
}

/// History files are not reliably UTF-8; decode lossily, never fail.
fn read_lossy_lines(path: &Path) -> Vec<String> {
    match std::fs::read(path) {
        Ok(raw) => String::from_utf8_lossy(&raw)
            .lines()
            .map(|l| l.to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Trim a history line and strip the zsh extended-history prefix
/// (`: 1234567890:0;command`).
fn normalize_history_line(line: &str) -> String {
    let command = line.trim();
    if let Some(rest) = command.strip_prefix(": ") {
        if rest.contains(':') {
            if let Some(idx) = command.find(';') {
                return command[idx + 1..].trim().to_string();
            }
        }
    }
    command.to_string()
}

/// Command texts already present in a log, for dedup.
fn existing_commands(log_path: &Path) -> HashSet<String> {
    read_log_values(log_path)
        .into_iter()
        .filter_map(|value| {
            value
                .get("command")
                .and_then(|c| c.as_str())
                .map(|c| c.trim().to_string())
        })
        .collect()
}

/// Parse a log file as a JSON array of values, preserving entries this
/// crate does not model. Anything else reads as empty.
fn read_log_values(path: &Path) -> Vec<serde_json::Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
        Ok(values) => values,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "unparseable activity log, skipping");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn zsh_extended_prefix_is_stripped() {
        assert_eq!(
            normalize_history_line(": 1712345678:0;cargo test --all"),
            "cargo test --all"
        );
        assert_eq!(normalize_history_line("  plain command  "), "plain command");
        // A leading ": " without the extended shape stays as-is.
        assert_eq!(normalize_history_line(": odd"), ": odd");
    }

    #[test]
    fn load_commands_aggregates_and_filters() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("device_a_2026-01-01.json"),
            r#"[
                {"type":"command","timestamp":"t1","command":"ls","cwd":"/"},
                {"type":"note","timestamp":"t2","command":"ignored","cwd":"/"},
                "junk element",
                {"type":"command","timestamp":"t3","command":"pwd","cwd":"/"}
            ]"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("device_b_2026-01-02.json"), "corrupt{").unwrap();
        std::fs::write(tmp.path().join("unrelated.json"), "[]").unwrap();

        let commands = load_commands(tmp.path());
        let texts: Vec<&str> = commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(texts, vec!["ls", "pwd"]);
    }

    #[test]
    fn load_commands_missing_dir_is_empty() {
        assert!(load_commands(Path::new("/no/such/logs")).is_empty());
    }

    #[test]
    fn existing_commands_dedups_against_log() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("device_x_2026-01-01.json");
        std::fs::write(
            &log,
            r#"[{"type":"command","timestamp":"t","command":" git status ","cwd":"/"}]"#,
        )
        .unwrap();
        let seen = existing_commands(&log);
        assert!(seen.contains("git status"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn log_values_preserve_unknown_entries() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("device_x_2026-01-01.json");
        std::fs::write(&log, r#"[{"type":"command","command":"a","extra":42}]"#).unwrap();
        let values = read_log_values(&log);
        assert_eq!(values[0].get("extra").and_then(|v| v.as_i64()), Some(42));
    }
}
