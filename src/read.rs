use crate::domain::{Document, DocumentPath, DocumentVersion};
use crate::error::DocstoreResult;
use crate::store::row::VersionRow;
use crate::store::{self, Store};
use serde::Serialize;
use sqlx::SqlitePool;
use std::ops::Deref;
use std::time::Instant;
use tracing::debug;

pub struct Reader {
    pool: SqlitePool,
}

/// A document as it is now, or one of its superseded snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "document", rename_all = "lowercase")]
pub enum Revision {
    Current(Document),
    Historical(DocumentVersion),
}

impl Revision {
    pub fn version(&self) -> i64 {
        match self {
            Revision::Current(doc) => doc.version,
            Revision::Historical(v) => v.version,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Revision::Current(doc) => &doc.content,
            Revision::Historical(v) => &v.content,
        }
    }
}

/// A read result together with the time it took.
///
/// Derefs to the result, so `outcome.is_some()` or `outcome.len()` work
/// directly; use [`ReadOutcome::into_inner`] to take ownership.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutcome<T> {
    pub value: T,
    pub latency_ms: u64,
}

impl<T> ReadOutcome<T> {
    fn timed(value: T, started: Instant) -> Self {
        Self {
            value,
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for ReadOutcome<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl Reader {
    pub fn new(store: &Store) -> Self {
        Self {
            pool: store.pool.clone(),
        }
    }

    /// Returns the active document at `path`.
    ///
    /// Trashed, missing, and malformed paths all yield `None`.
    pub async fn read(&self, path: &str) -> DocstoreResult<ReadOutcome<Option<Document>>> {
        let started = Instant::now();
        let Ok(path) = DocumentPath::parse(path) else {
            return Ok(ReadOutcome::timed(None, started));
        };

        let outcome = ReadOutcome::timed(self.active(&path).await?, started);

        debug!(
            path = %path,
            found = outcome.is_some(),
            latency_ms = outcome.latency_ms,
            "read"
        );

        Ok(outcome)
    }

    /// Returns `version` of the active document at `path`: the live row when
    /// it is the current version, otherwise the matching history snapshot.
    pub async fn read_version(
        &self,
        path: &str,
        version: i64,
    ) -> DocstoreResult<ReadOutcome<Option<Revision>>> {
        let started = Instant::now();
        let Ok(path) = DocumentPath::parse(path) else {
            return Ok(ReadOutcome::timed(None, started));
        };

        let Some(doc) = self.active(&path).await? else {
            return Ok(ReadOutcome::timed(None, started));
        };

        if doc.version == version {
            return Ok(ReadOutcome::timed(Some(Revision::Current(doc)), started));
        }

        let row = sqlx::query_as::<_, VersionRow>(
            "SELECT document_id, version, content, metadata, created_at
             FROM document_versions
             WHERE document_id = ? AND version = ?",
        )
        .bind(doc.id.to_string())
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        let revision = row
            .map(|r| DocumentVersion::try_from(r).map(Revision::Historical))
            .transpose()?;

        debug!(path = %path, version, found = revision.is_some(), "read version");
        Ok(ReadOutcome::timed(revision, started))
    }

    /// Superseded snapshots of the active document at `path`, newest first.
    pub async fn history(&self, path: &str) -> DocstoreResult<ReadOutcome<Vec<DocumentVersion>>> {
        let started = Instant::now();
        let Ok(path) = DocumentPath::parse(path) else {
            return Ok(ReadOutcome::timed(Vec::new(), started));
        };

        let Some(doc) = self.active(&path).await? else {
            return Ok(ReadOutcome::timed(Vec::new(), started));
        };

        let rows = sqlx::query_as::<_, VersionRow>(
            "SELECT document_id, version, content, metadata, created_at
             FROM document_versions
             WHERE document_id = ?
             ORDER BY version DESC",
        )
        .bind(doc.id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let versions = rows
            .into_iter()
            .map(DocumentVersion::try_from)
            .collect::<DocstoreResult<Vec<_>>>()?;

        Ok(ReadOutcome::timed(versions, started))
    }

    async fn active(&self, path: &DocumentPath) -> DocstoreResult<Option<Document>> {
        let doc = store::find_by_path(&self.pool, path.as_str()).await?;
        Ok(doc.filter(|d| d.state.is_active()))
    }
}
