//! The SQLite-backed store shared by every engine.
//!
//! A [`Store`] owns the connection pool, the per-path lock table and the
//! configuration. It is cheap to clone; engines are built from a reference
//! to it, e.g. `Writer::new(&store)` or `Query::new(&store)`.

pub mod config;
pub(crate) mod locks;
pub(crate) mod row;
mod schema;

use crate::domain::{Document, DocumentId};
use crate::error::DocstoreResult;
use config::StoreConfig;
use locks::PathLocks;
use row::{DOCUMENT_COLUMNS, DocumentRow};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Store {
    pub(crate) pool: SqlitePool,
    pub(crate) locks: Arc<PathLocks>,
    pub(crate) config: Arc<StoreConfig>,
}

impl Store {
    /// Opens (creating if needed) the database described by `config` and
    /// bootstraps the schema.
    pub async fn open(config: StoreConfig) -> DocstoreResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        schema::bootstrap(&pool).await?;

        info!(path = %config.database_path.display(), "document store opened");

        Ok(Store {
            pool,
            locks: Arc::new(PathLocks::default()),
            config: Arc::new(config),
        })
    }

    /// Opens a store at an explicit database file with default settings.
    pub async fn open_at(path: impl AsRef<Path>) -> DocstoreResult<Self> {
        Self::open(StoreConfig::at(path)).await
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Waits for in-flight queries and closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Fetches the row at `path` whatever its lifecycle state.
pub(crate) async fn find_by_path<'e, E>(executor: E, path: &str) -> DocstoreResult<Option<Document>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents d WHERE d.path = ?");
    let row = sqlx::query_as::<_, DocumentRow>(&sql)
        .bind(path)
        .fetch_optional(executor)
        .await?;

    row.map(Document::try_from).transpose()
}

/// Removes a document row and all of its history. Returns the number of
/// history rows removed.
pub(crate) async fn erase(conn: &mut SqliteConnection, id: DocumentId) -> DocstoreResult<u64> {
    let id = id.to_string();

    let versions = sqlx::query("DELETE FROM document_versions WHERE document_id = ?")
        .bind(&id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(&id)
        .execute(&mut *conn)
        .await?;

    Ok(versions)
}
