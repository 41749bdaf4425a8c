//! Filesystem crawler: walk configured roots under exclusion and size
//! rules, yielding one [`FileRecord`] per indexable file.
//!
//! The crawl is lazy and best-effort. Unreadable subtrees and files that
//! disappear mid-walk are skipped, never aborting the pass. No ordering is
//! guaranteed within or across roots; consumers needing determinism sort.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::models::FileRecord;

/// Extensions whose content we index. Lower-case comparison.
pub const INDEXABLE_EXTENSIONS: &[&str] = &[
    // Documents & notes
    "txt", "md", "rst", "tex", "latex", "org", "adoc", "asciidoc", "docx", "pdf",
    // Data & config
    "json", "yml", "yaml", "toml", "ini", "cfg", "conf", "xml", "csv",
    // Web
    "html", "htm", "xhtml", "css", "scss", "sass", "less",
    // JavaScript / TypeScript
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "vue",
    // Python
    "py", "pyw", "pyi",
    // Other common text-based source
    "c", "h", "cpp", "hpp", "cc", "cxx", "java", "kt", "kts", "rs", "go", "r", "rb", "php",
    "swift", "sql", "sh", "bash", "zsh", "ps1", "bat", "cmd", "rq", "sparql",
    // Other
    "log", "diff", "patch", "svg", "graphql", "gql",
];

/// Formats that legitimately exceed the ordinary size limit (e-books,
/// long reports). These get a fixed 10 MB ceiling instead.
const LARGE_FILE_EXTENSIONS: &[&str] = &["docx", "pdf"];
const LARGE_FILE_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Walk `folders` and yield a record per indexable file.
///
/// Non-existent or non-directory roots are skipped silently. A file is
/// skipped when its extension is not allow-listed, when any path component
/// under the root matches an exclude pattern (case-insensitive), or when it
/// exceeds the applicable size ceiling.
pub fn crawl(
    folders: &[PathBuf],
    exclude_patterns: &[String],
    max_file_size_kb: u64,
) -> impl Iterator<Item = FileRecord> + 'static {
    let max_bytes = max_file_size_kb.saturating_mul(1024);
    let excludes: Arc<Vec<String>> = Arc::new(
        exclude_patterns
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect(),
    );
    let roots: Vec<PathBuf> = folders.to_vec();

    roots
        .into_iter()
        .flat_map(move |root| crawl_root(root, Arc::clone(&excludes), max_bytes))
}

fn crawl_root(
    root: PathBuf,
    excludes: Arc<Vec<String>>,
    max_bytes: u64,
) -> impl Iterator<Item = FileRecord> {
    let walker = if root.is_dir() {
        Some(WalkDir::new(&root).into_iter())
    } else {
        None
    };

    walker
        .into_iter()
        .flatten()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(%err, "skipping unreadable entry");
                    return None;
                }
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let path = entry.path();
            if !has_indexable_extension(path) {
                return None;
            }
            if is_excluded(path, &root, &excludes) {
                return None;
            }
            let meta = entry.metadata().ok()?;
            if meta.len() > size_limit(path, max_bytes) {
                return None;
            }
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            Some(FileRecord {
                path: canonical,
                mtime,
                size: meta.len(),
            })
        })
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn has_indexable_extension(path: &Path) -> bool {
    extension_lowercase(path)
        .map(|ext| INDEXABLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// True when any path component below the root matches an exclude pattern.
fn is_excluded(path: &Path, root: &Path, excludes: &[String]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| {
        let name = component.as_os_str().to_string_lossy().to_lowercase();
        excludes.iter().any(|pattern| *pattern == name)
    })
}

fn size_limit(path: &Path, max_bytes: u64) -> u64 {
    let is_large_format = extension_lowercase(path)
        .map(|ext| LARGE_FILE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    if is_large_format {
        LARGE_FILE_MAX_BYTES
    } else {
        max_bytes
    }
}
