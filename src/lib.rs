//! # LodeSearch
//!
//! Local, personal full-text search over a user's files and shell-command
//! history.
//!
//! Each indexing pass crawls the configured folders under exclusion and
//! size rules, extracts searchable text per file type under strict
//! resource bounds, merges in command-history documents from the activity
//! logs, and destructively rebuilds a full-text index; the query engine
//! answers ranked, snippeted searches against it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐
//! │ Crawler  │──▶│ Metadata  │──▶│  Extract  │──▶│  SQLite   │
//! │ walkdir  │   │ snapshot  │   │ txt/docx/ │   │   FTS5    │
//! └──────────┘   └───────────┘   │    pdf    │   └─────┬─────┘
//!                                └───────────┘         │
//! ┌──────────┐                         ▲               ▼
//! │ Activity │─────────────────────────┘         ┌───────────┐
//! │  logs    │                                   │  Search   │
//! └──────────┘                                   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use lodesearch::{Config, DataPaths, Indexer};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let paths = DataPaths::from_env();
//! paths.ensure()?;
//! let config = Config::load(&paths.config_path());
//!
//! let indexer = Indexer::new(paths);
//! let count = indexer.full_index(&config).await?;
//! println!("indexed {count} documents");
//!
//! let hits = lodesearch::search(indexer.store(), "deployment notes", 10).await?;
//! for hit in hits {
//!     println!("{} {}", hit.id, hit.snippet);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Indexing configuration (JSON) |
//! | [`paths`] | Data-directory layout |
//! | [`models`] | Core data types |
//! | [`crawler`] | Filesystem crawl under exclude/size rules |
//! | [`extract`] | Bounded, never-failing content extraction |
//! | [`metadata`] | Crawl snapshot persistence |
//! | [`activity`] | Shell-history activity source |
//! | [`store`] | Index store handle (SQLite FTS5) |
//! | [`index`] | Destructive index rebuild pipeline |
//! | [`search`] | Ranked, snippeted queries |

pub mod activity;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod index;
pub mod metadata;
pub mod models;
pub mod paths;
pub mod search;
pub mod store;

pub use config::Config;
pub use index::Indexer;
pub use models::{CommandRecord, FileRecord, IndexKind, SearchResult};
pub use paths::DataPaths;
pub use search::{index_exists, search};
pub use store::IndexStore;
