//! Crawl snapshot persistence.
//!
//! The snapshot is a flat JSON array of [`FileRecord`]s, overwritten
//! wholesale each pass. It lets [`crate::index::Indexer::rebuild_from_metadata`]
//! recreate the index without re-crawling the filesystem.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::FileRecord;

/// Atomically overwrite the snapshot: write a sibling temp file, then
/// rename it into place.
pub fn save(path: &Path, entries: &[FileRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("failed to write snapshot: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace snapshot: {}", path.display()))?;
    Ok(())
}

/// Load the snapshot. Missing, unreadable, or structurally invalid files
/// yield an empty list rather than an error.
pub fn load(path: &Path) -> Vec<FileRecord> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "invalid snapshot, treating as empty");
            Vec::new()
        }
    }
}
