//! Lightweight listing of active documents with the folder tree and tag
//! frequencies of the whole matching set.

use crate::domain::path::ancestors_of;
use crate::domain::{DocumentSummary, clean_tags, has_all_tags};
use crate::error::DocstoreResult;
use crate::search::filter::DocumentFilter;
use crate::store::Store;
use crate::store::config::StoreConfig;
use crate::store::row::{SUMMARY_COLUMNS, SummaryRow};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

pub struct Index {
    pool: SqlitePool,
    config: Arc<StoreConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexOrder {
    #[default]
    UpdatedDesc,
    PathAsc,
    TitleAsc,
}

impl IndexOrder {
    fn sql(self) -> &'static str {
        match self {
            IndexOrder::UpdatedDesc => " ORDER BY d.updated_at DESC, d.seq DESC",
            IndexOrder::PathAsc => " ORDER BY d.path ASC",
            IndexOrder::TitleAsc => " ORDER BY d.title ASC, d.path ASC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub folder: Option<String>,
    pub source: Option<String>,
    pub doc_type: Option<String>,
    pub tags: Vec<String>,
    pub order_by: IndexOrder,
    /// Defaults to the store's `default_index_limit`.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPage {
    pub documents: Vec<DocumentSummary>,
    /// Every ancestor folder of every matching document, sorted.
    pub folders: Vec<String>,
    /// Tag occurrences across every matching document.
    pub tag_counts: BTreeMap<String, u64>,
    pub total: u64,
    pub latency_ms: u64,
}

impl Index {
    pub fn new(store: &Store) -> Self {
        Self {
            pool: store.pool.clone(),
            config: store.config.clone(),
        }
    }

    /// Lists active documents matching the filters.
    ///
    /// `folders`, `tag_counts` and `total` describe the whole matching set;
    /// only `documents` is paginated.
    pub async fn list(&self, options: &IndexOptions) -> DocstoreResult<IndexPage> {
        let started = Instant::now();

        let filter = DocumentFilter::new(
            options.folder.as_deref(),
            options.source.as_deref(),
            options.doc_type.as_deref(),
        );
        let mut qb = filter.select(SUMMARY_COLUMNS);
        qb.push(options.order_by.sql());

        let rows = qb.build_query_as::<SummaryRow>().fetch_all(&self.pool).await?;

        let required = clean_tags(&options.tags);
        let mut matching = Vec::with_capacity(rows.len());
        for row in rows {
            let summary = DocumentSummary::try_from(row)?;
            if has_all_tags(&summary.tags, &required) {
                matching.push(summary);
            }
        }

        let (folders, tag_counts) = aggregate(&matching);
        let total = matching.len() as u64;

        let limit = options.limit.unwrap_or(self.config.default_index_limit) as usize;
        let offset = options.offset.unwrap_or(0) as usize;
        let documents: Vec<DocumentSummary> =
            matching.into_iter().skip(offset).take(limit).collect();

        let latency_ms = started.elapsed().as_millis() as u64;
        debug!(
            total,
            returned = documents.len(),
            folders = folders.len(),
            latency_ms,
            "index listed"
        );

        Ok(IndexPage {
            documents,
            folders,
            tag_counts,
            total,
            latency_ms,
        })
    }
}

fn aggregate(docs: &[DocumentSummary]) -> (Vec<String>, BTreeMap<String, u64>) {
    let mut folders = BTreeSet::new();
    let mut tag_counts = BTreeMap::new();

    for doc in docs {
        folders.extend(ancestors_of(&doc.path));
        for tag in &doc.tags {
            *tag_counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    (folders.into_iter().collect(), tag_counts)
}
