//! Query engine: ranked, snippeted search over a built index.
//!
//! Read-only. Searches open their own connections and may run concurrently
//! with each other and with a rebuild; the build's atomic swap means a
//! reader sees the whole old index or the whole new one. Degenerate inputs
//! degrade instead of erroring: an empty or malformed query, or an absent
//! index, all yield an empty result list.

use anyhow::Result;
use sqlx::Row;

use crate::models::{IndexKind, SearchResult};
use crate::store::IndexStore;

/// Snippets show this many characters of stored content.
const SNIPPET_CHARS: usize = 200;
const SNIPPET_ELLIPSIS: &str = "...";

/// True only if the index store exists, is non-empty, and opens cleanly.
pub async fn index_exists(store: &IndexStore) -> bool {
    store.exists().await
}

/// Run `query` against the content field, best match first, at most `limit`
/// results. The FTS5 query grammar applies (free-text terms at minimum);
/// a query it rejects yields an empty list rather than an error.
pub async fn search(store: &IndexStore, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    if !store.exists().await {
        return Ok(Vec::new());
    }
    let pool = match store.open_read().await {
        Ok(pool) => pool,
        Err(_) => return Ok(Vec::new()),
    };

    let rows = sqlx::query(
        r#"
        SELECT doc_id, kind, content
        FROM documents
        WHERE documents MATCH ?1
        ORDER BY rank
        LIMIT ?2
        "#,
    )
    .bind(query)
    .bind(limit as i64)
    .fetch_all(&pool)
    .await;
    pool.close().await;

    let rows = match rows {
        Ok(rows) => rows,
        Err(err) => {
            tracing::debug!(%err, "query rejected, returning no results");
            return Ok(Vec::new());
        }
    };

    let results = rows
        .iter()
        .map(|row| {
            let id: String = row.get("doc_id");
            let kind = IndexKind::from_stored(row.get::<String, _>("kind").as_str());
            let content: String = row.get("content");
            let copyable_text = match kind {
                IndexKind::Command => Some(content.clone()),
                IndexKind::File => None,
            };
            SearchResult {
                id,
                snippet: make_snippet(&content),
                kind,
                copyable_text,
            }
        })
        .collect();
    Ok(results)
}

/// First 200 characters of stored content, newlines collapsed to spaces,
/// trimmed; the ellipsis appears only when content was actually cut.
fn make_snippet(content: &str) -> String {
    let head: String = content.chars().take(SNIPPET_CHARS).collect();
    let mut snippet = head.replace(['\n', '\r'], " ").trim().to_string();
    if content.chars().count() > SNIPPET_CHARS {
        snippet.push_str(SNIPPET_ELLIPSIS);
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_has_no_ellipsis() {
        assert_eq!(make_snippet("hello world"), "hello world");
    }

    #[test]
    fn newlines_collapse_to_spaces() {
        assert_eq!(make_snippet("line one\nline two"), "line one line two");
    }

    #[test]
    fn exactly_200_chars_has_no_ellipsis() {
        let content = "x".repeat(200);
        assert_eq!(make_snippet(&content), content);
    }

    #[test]
    fn long_content_is_cut_at_200_with_ellipsis() {
        let content = format!("{}tail", "a".repeat(200));
        let snippet = make_snippet(&content);
        assert_eq!(snippet, format!("{}...", "a".repeat(200)));
    }

    #[test]
    fn snippet_is_trimmed() {
        assert_eq!(make_snippet("  padded  "), "padded");
    }

    #[test]
    fn multibyte_content_respects_char_boundaries() {
        let content = "é".repeat(300);
        let snippet = make_snippet(&content);
        assert_eq!(snippet.chars().count(), 200 + SNIPPET_ELLIPSIS.len());
    }
}
