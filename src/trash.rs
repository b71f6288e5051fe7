//! Soft delete, restore and permanent delete.
//!
//! Expected business-rule violations (deleting something already trashed,
//! restoring an active document, ...) are reported inside [`TrashOutcome`]
//! rather than as errors. Only storage failures surface as `Err`.

use crate::domain::{Document, DocumentPath, DocumentSummary};
use crate::error::{DocstoreError, DocstoreResult};
use crate::search::filter::{DocumentFilter, Visibility};
use crate::store::locks::PathLocks;
use crate::store::row::{SUMMARY_COLUMNS, SummaryRow, encode_timestamp, now};
use crate::store::{self, Store};
use serde::{Serialize, Serializer};
use sqlx::SqlitePool;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

pub struct Trash {
    pool: SqlitePool,
    locks: Arc<PathLocks>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrashAction {
    SoftDeleted,
    Restored,
    PermanentlyDeleted,
}

impl fmt::Display for TrashAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrashAction::SoftDeleted => "soft-deleted",
            TrashAction::Restored => "restored",
            TrashAction::PermanentlyDeleted => "permanently-deleted",
        })
    }
}

/// Why a trash transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrashRejection {
    /// Delete found nothing active; `trashed` tells the two cases apart.
    #[error("not found or already deleted")]
    NotActive { trashed: bool },

    #[error("not found")]
    NotFound,

    #[error("not deleted")]
    NotDeleted,

    #[error("not in trash (must be soft-deleted first)")]
    NotInTrash,
}

impl TrashRejection {
    /// True when the document exists but is in the wrong lifecycle state.
    pub fn is_state_conflict(&self) -> bool {
        match self {
            TrashRejection::NotActive { trashed } => *trashed,
            TrashRejection::NotFound => false,
            TrashRejection::NotDeleted | TrashRejection::NotInTrash => true,
        }
    }
}

impl From<TrashRejection> for DocstoreError {
    fn from(rejection: TrashRejection) -> Self {
        if rejection.is_state_conflict() {
            DocstoreError::StateConflict(rejection.to_string())
        } else {
            DocstoreError::NotFound(rejection.to_string())
        }
    }
}

impl Serialize for TrashRejection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<TrashAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TrashRejection>,
    pub latency_ms: u64,
}

impl TrashOutcome {
    fn done(action: TrashAction, started: Instant) -> Self {
        Self {
            success: true,
            action: Some(action),
            error: None,
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn rejected(rejection: TrashRejection, started: Instant) -> Self {
        Self {
            success: false,
            action: None,
            error: Some(rejection),
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Turns a refusal into the matching [`DocstoreError`].
    pub fn into_result(self) -> DocstoreResult<TrashAction> {
        match (self.action, self.error) {
            (Some(action), _) => Ok(action),
            (None, Some(rejection)) => Err(rejection.into()),
            (None, None) => Err(DocstoreError::NotFound("no trash action recorded".into())),
        }
    }
}

impl Trash {
    pub fn new(store: &Store) -> Self {
        Self {
            pool: store.pool.clone(),
            locks: store.locks.clone(),
        }
    }

    /// Moves the active document at `path` to the trash.
    pub async fn delete(&self, path: &str) -> DocstoreResult<TrashOutcome> {
        let started = Instant::now();
        let Ok(path) = DocumentPath::parse(path) else {
            return Ok(TrashOutcome::rejected(
                TrashRejection::NotActive { trashed: false },
                started,
            ));
        };
        let _guard = self.locks.lock(path.as_str()).await;

        let doc = match self.find(&path).await? {
            Some(doc) if doc.state.is_active() => doc,
            other => {
                let rejection = TrashRejection::NotActive {
                    trashed: other.is_some(),
                };
                return Ok(TrashOutcome::rejected(rejection, started));
            }
        };

        let res = sqlx::query("UPDATE documents SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(encode_timestamp(now()))
            .bind(doc.id.to_string())
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            let rejection = TrashRejection::NotActive { trashed: true };
            return Ok(TrashOutcome::rejected(rejection, started));
        }

        info!(path = %path, version = doc.version, "document moved to trash");
        Ok(TrashOutcome::done(TrashAction::SoftDeleted, started))
    }

    /// Brings the trashed document at `path` back, content and history intact.
    pub async fn restore(&self, path: &str) -> DocstoreResult<TrashOutcome> {
        let started = Instant::now();
        let Ok(path) = DocumentPath::parse(path) else {
            return Ok(TrashOutcome::rejected(TrashRejection::NotFound, started));
        };
        let _guard = self.locks.lock(path.as_str()).await;

        let doc = match self.find(&path).await? {
            None => return Ok(TrashOutcome::rejected(TrashRejection::NotFound, started)),
            Some(doc) if doc.state.is_active() => {
                return Ok(TrashOutcome::rejected(TrashRejection::NotDeleted, started));
            }
            Some(doc) => doc,
        };

        let res = sqlx::query("UPDATE documents SET deleted_at = NULL WHERE id = ? AND deleted_at IS NOT NULL")
            .bind(doc.id.to_string())
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Ok(TrashOutcome::rejected(TrashRejection::NotDeleted, started));
        }

        info!(path = %path, version = doc.version, "document restored");
        Ok(TrashOutcome::done(TrashAction::Restored, started))
    }

    /// Erases the trashed document at `path` and its entire history.
    pub async fn permanent_delete(&self, path: &str) -> DocstoreResult<TrashOutcome> {
        let started = Instant::now();
        let Ok(path) = DocumentPath::parse(path) else {
            return Ok(TrashOutcome::rejected(TrashRejection::NotFound, started));
        };
        let _guard = self.locks.lock(path.as_str()).await;

        let doc = match self.find(&path).await? {
            None => return Ok(TrashOutcome::rejected(TrashRejection::NotFound, started)),
            Some(doc) if doc.state.is_active() => {
                return Ok(TrashOutcome::rejected(TrashRejection::NotInTrash, started));
            }
            Some(doc) => doc,
        };

        let mut tx = self.pool.begin().await?;
        let history_rows = store::erase(&mut *tx, doc.id).await?;
        tx.commit().await?;

        info!(path = %path, history_rows, "document permanently deleted");
        Ok(TrashOutcome::done(TrashAction::PermanentlyDeleted, started))
    }

    /// Trashed documents, most recently deleted first.
    pub async fn list(&self) -> DocstoreResult<Vec<DocumentSummary>> {
        let filter = DocumentFilter::default().with_visibility(Visibility::Trashed);
        let mut qb = filter.select(SUMMARY_COLUMNS);
        qb.push(" ORDER BY d.deleted_at DESC, d.seq DESC");

        let rows = qb.build_query_as::<SummaryRow>().fetch_all(&self.pool).await?;
        debug!(count = rows.len(), "trash listed");

        rows.into_iter().map(DocumentSummary::try_from).collect()
    }

    async fn find(&self, path: &DocumentPath) -> DocstoreResult<Option<Document>> {
        store::find_by_path(&self.pool, path.as_str()).await
    }
}
