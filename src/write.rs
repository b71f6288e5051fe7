//! Create-or-update with automatic versioning.
//!
//! Each write to an existing active document appends a snapshot of its
//! previous content to `document_versions` and bumps the version by one.
//! Writing to a path held only by a trashed document erases that document
//! and its history before creating a fresh one at version 1.

use crate::domain::{
    self, Document, DocumentId, DocumentPath, Metadata, clean_tags, resolve_title,
};
use crate::error::{DocstoreError, DocstoreResult};
use crate::store::locks::PathLocks;
use crate::store::row::{encode_metadata, encode_tags, encode_timestamp, now};
use crate::store::{self, Store};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Writer {
    pool: SqlitePool,
    locks: Arc<PathLocks>,
}

/// Optional fields of a write. On update, `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Metadata>,
    pub source: Option<String>,
    pub doc_type: Option<String>,
}

impl WriteOptions {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    fn explicit_title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub id: DocumentId,
    pub path: String,
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<i64>,
    pub action: WriteAction,
    pub latency_ms: u64,
}

impl Writer {
    pub fn new(store: &Store) -> Self {
        Self {
            pool: store.pool.clone(),
            locks: store.locks.clone(),
        }
    }

    /// Creates or updates the document at `path`.
    ///
    /// Returns [`DocstoreError::Validation`] when `path` or `content` is
    /// blank; nothing is written in that case.
    pub async fn write(
        &self,
        path: &str,
        content: &str,
        options: &WriteOptions,
    ) -> DocstoreResult<WriteOutcome> {
        let started = Instant::now();
        let path = DocumentPath::parse(path)?;
        domain::validate_content(content)?;

        let _guard = self.locks.lock(path.as_str()).await;

        let mut outcome = match store::find_by_path(&self.pool, path.as_str()).await? {
            Some(current) if current.state.is_active() => {
                self.update(current, content, options).await?
            }
            tombstone => self.create(&path, tombstone, content, options).await?,
        };

        outcome.latency_ms = started.elapsed().as_millis() as u64;

        info!(
            path = %outcome.path,
            version = outcome.version,
            action = ?outcome.action,
            latency_ms = outcome.latency_ms,
            "document written"
        );

        Ok(outcome)
    }

    async fn create(
        &self,
        path: &DocumentPath,
        tombstone: Option<Document>,
        content: &str,
        options: &WriteOptions,
    ) -> DocstoreResult<WriteOutcome> {
        let id = DocumentId::generate();
        let title = resolve_title(options.explicit_title(), content, path);
        let tags = clean_tags(options.tags.iter().flatten());
        let ts = encode_timestamp(now());

        let mut tx = self.pool.begin().await?;

        if let Some(tombstone) = tombstone {
            let erased = store::erase(&mut *tx, tombstone.id).await?;
            debug!(
                path = %path,
                old_version = tombstone.version,
                history_rows = erased,
                "erased trashed document to reuse its path"
            );
        }

        sqlx::query(
            "INSERT INTO documents
                (id, path, title, content, tags, metadata, source, doc_type, version, created_at, updated_at, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, NULL)",
        )
        .bind(id.to_string())
        .bind(path.as_str())
        .bind(&title)
        .bind(content)
        .bind(encode_tags(&tags)?)
        .bind(encode_metadata(options.metadata.as_ref())?)
        .bind(options.source.as_deref())
        .bind(options.doc_type.as_deref())
        .bind(&ts)
        .bind(&ts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(WriteOutcome {
            id,
            path: path.to_string(),
            version: 1,
            previous_version: None,
            action: WriteAction::Created,
            latency_ms: 0,
        })
    }

    async fn update(
        &self,
        current: Document,
        content: &str,
        options: &WriteOptions,
    ) -> DocstoreResult<WriteOutcome> {
        let title = options
            .explicit_title()
            .map(str::to_owned)
            .unwrap_or_else(|| current.title.clone());
        let tags = match &options.tags {
            Some(tags) => clean_tags(tags),
            None => current.tags.clone(),
        };
        let metadata = options.metadata.as_ref().or(current.metadata.as_ref());
        let source = options.source.as_deref().or(current.source.as_deref());
        let doc_type = options.doc_type.as_deref().or(current.doc_type.as_deref());
        let next_version = current.version + 1;
        let id = current.id.to_string();
        let superseded_at = encode_timestamp(now());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO document_versions (document_id, version, content, metadata, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(current.version)
        .bind(&current.content)
        .bind(encode_metadata(current.metadata.as_ref())?)
        .bind(&superseded_at)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            "UPDATE documents
             SET title = ?, content = ?, tags = ?, metadata = ?, source = ?, doc_type = ?,
                 version = ?, updated_at = ?
             WHERE id = ? AND version = ? AND deleted_at IS NULL",
        )
        .bind(&title)
        .bind(content)
        .bind(encode_tags(&tags)?)
        .bind(encode_metadata(metadata)?)
        .bind(source)
        .bind(doc_type)
        .bind(next_version)
        .bind(&superseded_at)
        .bind(&id)
        .bind(current.version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            tx.rollback().await?;
            warn!(path = %current.path, expected = current.version, "version moved underneath update");
            return Err(DocstoreError::VersionConflict {
                path: current.path,
                expected: current.version,
            });
        }

        tx.commit().await?;

        Ok(WriteOutcome {
            id: current.id,
            path: current.path,
            version: next_version,
            previous_version: Some(current.version),
            action: WriteAction::Updated,
            latency_ms: 0,
        })
    }
}
