use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit database file.
pub const DATABASE_ENV: &str = "DOCSTORE_DATABASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("data directory not found")]
    NoDataDir,

    #[error("invalid store name: {0:?}")]
    InvalidName(String),
}

/// Settings for opening a [`Store`](crate::store::Store).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file; created on first open.
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,

    /// Length in characters of list-all snippets.
    pub snippet_chars: usize,

    /// Size in tokens of the full-text snippet window.
    pub snippet_tokens: u32,

    pub default_search_limit: u32,

    pub default_index_limit: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("docstore.db"),
            max_connections: 8,
            busy_timeout: Duration::from_secs(5),
            snippet_chars: 200,
            snippet_tokens: 32,
            default_search_limit: 20,
            default_index_limit: 100,
        }
    }
}

impl StoreConfig {
    /// Uses an explicit database file.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            database_path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Resolves a named store under `<data dir>/docstore/{name}.db`.
    ///
    /// - Returns [`ConfigError::InvalidName`] if the name is blank or has
    ///   characters not valid in filenames.
    /// - Returns [`ConfigError::NoDataDir`] if the platform data directory
    ///   cannot be determined.
    pub fn named(name: &str) -> Result<Self, ConfigError> {
        let name = Self::valid_name(name)?;
        let base = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;

        Ok(Self::at(base.join("docstore").join(format!("{name}.db"))))
    }

    /// Reads [`DATABASE_ENV`], falling back to the store named `default`.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(DATABASE_ENV) {
            Ok(path) if !path.trim().is_empty() => Ok(Self::at(path.trim())),
            _ => Self::named("default"),
        }
    }

    /// Trims the name and rejects forbidden characters
    /// (`/`, `\`, `:`, `"`, `*`, `?`, `<`, `>`, `|`).
    fn valid_name(name: &str) -> Result<String, ConfigError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(ConfigError::InvalidName(name.to_owned()));
        }

        if trimmed.contains(&['/', '\\', ':', '"', '*', '?', '<', '>', '|'][..]) {
            return Err(ConfigError::InvalidName(name.to_owned()));
        }

        Ok(trimmed.to_owned())
    }
}
