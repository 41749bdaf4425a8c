//! Index builder: destructive full rebuild of the search index.
//!
//! One pass is crawl → snapshot → extract → write. Extraction fans out over
//! the blocking pool with bounded concurrency; the writer is a single
//! transaction committed once. The policy is deliberate: every build wipes
//! and recreates the whole index, trading O(corpus) rebuild time for the
//! absence of stale documents, duplicate ids, and tombstones.

use anyhow::Result;
use sqlx::{Sqlite, Transaction};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::activity;
use crate::config::Config;
use crate::crawler;
use crate::extract;
use crate::metadata;
use crate::models::{CommandRecord, FileRecord, IndexKind};
use crate::paths::DataPaths;
use crate::store::IndexStore;

/// Concurrent extraction workers per build.
const EXTRACT_CONCURRENCY: usize = 8;
/// Stored in place of empty extraction output so every crawled file still
/// lands in the index.
const EMPTY_CONTENT_PLACEHOLDER: &str = " ";
/// Id prefix for command documents: `command:<timestamp>:<n>`.
pub const COMMAND_ID_PREFIX: &str = "command";

/// Orchestrates indexing passes against one data dir and one store.
pub struct Indexer {
    paths: DataPaths,
    store: IndexStore,
}

impl Indexer {
    pub fn new(paths: DataPaths) -> Self {
        let store = IndexStore::new(paths.index_dir());
        Self { paths, store }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Full pass: sync shell history (when enabled), crawl, persist the
    /// snapshot, and rebuild the index from files plus logged commands.
    /// Returns the total document count.
    pub async fn full_index(&self, config: &Config) -> Result<usize> {
        if config.log_terminal_history {
            match activity::sync_history(&self.paths.logs_dir()) {
                Ok(appended) => tracing::debug!(appended, "history sync complete"),
                Err(err) => {
                    tracing::warn!(%err, "history sync failed, indexing existing logs only")
                }
            }
        }

        let entries: Vec<FileRecord> = crawler::crawl(
            &config.folders_to_index,
            &config.exclude_patterns,
            config.max_file_size_kb,
        )
        .collect();
        metadata::save(&self.paths.snapshot_path(), &entries)?;

        let commands = activity::load_commands(&self.paths.logs_dir());
        self.build(&entries, &commands).await
    }

    /// Rebuild from the persisted snapshot and existing activity logs,
    /// without re-crawling or refreshing history. Used when the index
    /// store is lost or corrupted.
    pub async fn rebuild_from_metadata(&self) -> Result<usize> {
        let entries = metadata::load(&self.paths.snapshot_path());
        let commands = activity::load_commands(&self.paths.logs_dir());
        self.build(&entries, &commands).await
    }

    /// Destructively rebuild the index from the given records. Per-document
    /// failures are skipped; only storage-level failure is fatal.
    pub async fn build(&self, files: &[FileRecord], commands: &[CommandRecord]) -> Result<usize> {
        let contents = extract_all(files).await;

        let pool = self.store.open_build().await?;
        let mut tx = pool.begin().await?;
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut count = 0usize;

        for (record, content) in files.iter().zip(contents) {
            let id = record.path.to_string_lossy().into_owned();
            if id.is_empty() || !seen_ids.insert(id.clone()) {
                continue;
            }
            let content = if content.is_empty() {
                EMPTY_CONTENT_PLACEHOLDER.to_string()
            } else {
                content
            };
            match insert_document(&mut tx, &id, IndexKind::File, &content).await {
                Ok(()) => count += 1,
                Err(err) => tracing::warn!(%id, %err, "skipping document write"),
            }
        }

        for (position, command) in commands.iter().enumerate() {
            let text = command.command.trim();
            if text.is_empty() {
                continue;
            }
            let id = command_doc_id(&command.timestamp, position);
            if !seen_ids.insert(id.clone()) {
                continue;
            }
            match insert_document(&mut tx, &id, IndexKind::Command, text).await {
                Ok(()) => count += 1,
                Err(err) => tracing::warn!(%id, %err, "skipping command write"),
            }
        }

        tx.commit().await?;
        pool.close().await;
        self.store.swap_in_build()?;
        tracing::debug!(count, "index rebuilt");
        Ok(count)
    }
}

/// The position component keeps ids unique when timestamps collide.
fn command_doc_id(timestamp: &str, position: usize) -> String {
    let ts = if timestamp.is_empty() {
        position.to_string()
    } else {
        timestamp.to_string()
    };
    format!("{COMMAND_ID_PREFIX}:{ts}:{position}")
}

/// Extract all file contents with bounded fan-out, preserving input order.
async fn extract_all(files: &[FileRecord]) -> Vec<String> {
    let semaphore = Arc::new(Semaphore::new(EXTRACT_CONCURRENCY));
    let mut join_set = JoinSet::new();
    for (position, record) in files.iter().enumerate() {
        let path = record.path.clone();
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (position, extract::extract(&path).await)
        });
    }

    let mut contents = vec![String::new(); files.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((position, text)) => contents[position] = text,
            Err(err) => tracing::warn!(%err, "extraction task failed"),
        }
    }
    contents
}

async fn insert_document(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
    kind: IndexKind,
    content: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO documents (doc_id, kind, content) VALUES (?, ?, ?)")
        .bind(id)
        .bind(kind.as_str())
        .bind(content)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_stay_unique_under_timestamp_collision() {
        let a = command_doc_id("2026-01-05T10:00:00", 0);
        let b = command_doc_id("2026-01-05T10:00:00", 1);
        assert_ne!(a, b);
        assert!(a.starts_with("command:"));
    }

    #[test]
    fn blank_timestamp_falls_back_to_position() {
        assert_eq!(command_doc_id("", 7), "command:7:7");
    }
}
