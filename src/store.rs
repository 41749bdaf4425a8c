//! Index store handle.
//!
//! An explicit [`IndexStore`] value (not ambient process state) owns the
//! on-disk location of one full-text index, so multiple independent stores
//! and isolated tests coexist. Storage is a single SQLite database holding
//! one FTS5 virtual table; rebuilds write a sibling `index.db.tmp` and
//! rename it into place, so readers observe either the entire old index or
//! the entire new one.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const INDEX_FILE: &str = "index.db";
const BUILD_FILE: &str = "index.db.tmp";

#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The live database readers open.
    pub fn db_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn build_path(&self) -> PathBuf {
        self.dir.join(BUILD_FILE)
    }

    /// Open a fresh build database with the schema created. Failing here
    /// means no index can be produced at all, so errors propagate.
    pub(crate) async fn open_build(&self) -> Result<SqlitePool> {
        std::fs::create_dir_all(&self.dir)?;
        let build = self.build_path();
        if build.exists() {
            std::fs::remove_file(&build)?;
        }
        // Rollback journal keeps the build to a single file for the swap.
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", build.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(
            "CREATE VIRTUAL TABLE documents USING fts5(doc_id UNINDEXED, kind UNINDEXED, content)",
        )
        .execute(&pool)
        .await?;
        Ok(pool)
    }

    /// Atomically replace the live index with the finished build.
    /// The build pool must be closed first.
    pub(crate) fn swap_in_build(&self) -> Result<()> {
        std::fs::rename(self.build_path(), self.db_path())?;
        Ok(())
    }

    pub(crate) async fn open_read(&self) -> Result<SqlitePool> {
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", self.db_path().display()))?
                .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Ok(pool)
    }

    /// True only when the index exists, is non-empty, and opens with the
    /// expected schema. Missing or corrupt storage reports false.
    pub async fn exists(&self) -> bool {
        let nonempty = std::fs::metadata(self.db_path())
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !nonempty {
            return false;
        }
        let pool = match self.open_read().await {
            Ok(pool) => pool,
            Err(_) => return false,
        };
        let has_table = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'documents'",
        )
        .fetch_one(&pool)
        .await
        .map(|n| n > 0)
        .unwrap_or(false);
        pool.close().await;
        has_table
    }
}
