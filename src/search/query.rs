use crate::domain::{Document, DocumentSummary, clean_tags, has_all_tags};
use crate::error::DocstoreResult;
use crate::search::filter::DocumentFilter;
use crate::search::fts;
use crate::store::Store;
use crate::store::config::StoreConfig;
use crate::store::row::{DOCUMENT_COLUMNS, DocumentRow};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// FTS5 caps snippet windows at 64 tokens.
const MAX_SNIPPET_TOKENS: u32 = 64;

pub struct Query {
    pool: SqlitePool,
    config: Arc<StoreConfig>,
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(flatten)]
    pub document: DocumentSummary,

    /// Content excerpt. On full-text searches matches are wrapped in
    /// `<mark>`/`</mark>`; on list-all it is a plain prefix of the content.
    pub snippet: String,

    /// BM25 relevance, lower is better. `None` on list-all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub documents: Vec<SearchResult>,
    /// Matches before pagination, after every filter.
    pub total: u64,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Path prefix; `/work` matches `/work` and everything below it.
    pub folder: Option<String>,

    /// Every listed tag must be present on a hit.
    pub tags: Vec<String>,

    pub source: Option<String>,

    pub doc_type: Option<String>,

    /// Defaults to the store's `default_search_limit`.
    pub limit: Option<u32>,

    pub offset: Option<u32>,
}

#[derive(sqlx::FromRow)]
struct HitRow {
    #[sqlx(flatten)]
    doc: DocumentRow,
    snippet: Option<String>,
    rank: Option<f64>,
}

impl Query {
    pub fn new(store: &Store) -> Self {
        Self {
            pool: store.pool.clone(),
            config: store.config.clone(),
        }
    }

    /// Searches active documents.
    ///
    /// A blank query or `*` lists everything matching the filters, newest
    /// first. Anything else goes through the full-text index, which supports
    /// `"exact phrases"`, `AND`/`OR`/`NOT` and `prefix*` terms, ranked by
    /// relevance. A query opening with `NOT` lists, newest first, whatever
    /// the negated part does not match. A query with nothing searchable in
    /// it returns an empty page.
    ///
    /// Tags are not indexed individually, so a tag filter loads every
    /// candidate, keeps those carrying all requested tags, and only then
    /// applies `limit`/`offset`.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> DocstoreResult<SearchPage> {
        let started = Instant::now();

        let text = match query.trim() {
            "" | "*" => None,
            q => match fts::prepare(q) {
                Some(prepared) => Some(prepared),
                None => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    debug!(query, latency_ms, "nothing searchable in query");
                    return Ok(SearchPage {
                        documents: Vec::new(),
                        total: 0,
                        latency_ms,
                    });
                }
            },
        };
        let filter = DocumentFilter::new(
            options.folder.as_deref(),
            options.source.as_deref(),
            options.doc_type.as_deref(),
        )
        .with_text(text);

        let limit = options.limit.unwrap_or(self.config.default_search_limit);
        let offset = options.offset.unwrap_or(0);
        let required = clean_tags(&options.tags);

        let (documents, total) = if required.is_empty() {
            let total = self.count(&filter).await?;
            let documents = self.fetch(&filter, Some((limit, offset))).await?;
            (documents, total)
        } else {
            let matching: Vec<SearchResult> = self
                .fetch(&filter, None)
                .await?
                .into_iter()
                .filter(|hit| has_all_tags(&hit.document.tags, &required))
                .collect();
            let total = matching.len() as u64;
            let page = matching
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
            (page, total)
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        debug!(
            query,
            ranked = filter.is_ranked(),
            total,
            returned = documents.len(),
            latency_ms,
            "search"
        );

        Ok(SearchPage {
            documents,
            total,
            latency_ms,
        })
    }

    /// Completes a path prefix among active documents, sorted by path.
    pub async fn suggest(&self, prefix: &str, limit: Option<u32>) -> DocstoreResult<Vec<String>> {
        let limit = limit.unwrap_or(10);
        let prefix = match prefix.trim() {
            p if p.starts_with('/') => p.to_owned(),
            p => format!("/{p}"),
        };

        let rows = sqlx::query(
            r#"
            SELECT path
            FROM documents
            WHERE deleted_at IS NULL AND substr(path, 1, ?) = ?
            ORDER BY path
            LIMIT ?
            "#,
        )
        .bind(prefix.chars().count() as i64)
        .bind(&prefix)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut suggestions = Vec::new();
        for row in rows {
            let path: String = row.get(0);
            suggestions.push(path);
        }

        Ok(suggestions)
    }

    async fn count(&self, filter: &DocumentFilter) -> DocstoreResult<u64> {
        let mut qb = filter.count();
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn fetch(
        &self,
        filter: &DocumentFilter,
        page: Option<(u32, u32)>,
    ) -> DocstoreResult<Vec<SearchResult>> {
        let mut qb = if filter.is_ranked() {
            let tokens = self.config.snippet_tokens.clamp(1, MAX_SNIPPET_TOKENS);
            let mut qb = filter.select(&format!(
                "{DOCUMENT_COLUMNS}, \
                 snippet(documents_fts, -1, '<mark>', '</mark>', '...', {tokens}) AS snippet, \
                 bm25(documents_fts) AS rank"
            ));
            qb.push(" ORDER BY rank, d.seq");
            qb
        } else {
            let mut qb = filter.select(&format!(
                "{DOCUMENT_COLUMNS}, NULL AS snippet, NULL AS rank"
            ));
            qb.push(" ORDER BY d.updated_at DESC, d.seq DESC");
            qb
        };

        if let Some((limit, offset)) = page {
            qb.push(" LIMIT ")
                .push_bind(i64::from(limit))
                .push(" OFFSET ")
                .push_bind(i64::from(offset));
        }

        let rows = qb.build_query_as::<HitRow>().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row| -> DocstoreResult<SearchResult> {
                let snippet = match row.snippet {
                    Some(snippet) => snippet,
                    None => prefix_snippet(&row.doc.content, self.config.snippet_chars),
                };
                Ok(SearchResult {
                    document: Document::try_from(row.doc)?.summary(),
                    snippet,
                    rank: row.rank,
                })
            })
            .collect()
    }
}

/// First `max_chars` characters of `content`, with `...` when cut.
pub(crate) fn prefix_snippet(content: &str, max_chars: usize) -> String {
    let mut chars = content.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", content[..cut].trim_end()),
        None => content.to_owned(),
    }
}
