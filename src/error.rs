use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocstoreError {
    #[error(transparent)]
    Validation(#[from] crate::domain::DocumentError),

    #[error(transparent)]
    Config(#[from] crate::store::config::ConfigError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("version conflict on {path}: expected version {expected}")]
    VersionConflict { path: String, expected: i64 },

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type DocstoreResult<T> = Result<T, DocstoreError>;
