//! # docstore_core
//!
//! A personal document store: small text documents addressed by
//! hierarchical paths (`/work/notes/x`), with automatic version history,
//! full-text search, folder/tag listings and a trash.
//!
//! ## Features
//!
//! - **Versioned writes**: every update snapshots the previous content
//! - **Full-text search**: SQLite FTS5 with phrases, boolean operators,
//!   prefix matching, ranking and highlighted snippets
//! - **Listings**: folder tree and tag frequencies across the matching set
//! - **Trash**: soft delete, restore and permanent delete
//! - **Per-path serialization**: concurrent writers to one path never race
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docstore_core::store::Store;
//! use docstore_core::write::{Writer, WriteOptions};
//! use docstore_core::read::Reader;
//!
//! # async fn run() -> docstore_core::DocstoreResult<()> {
//! let store = Store::open_at("/tmp/docs.db").await?;
//!
//! let writer = Writer::new(&store);
//! let first = writer
//!     .write("/work/plan", "# Plan\nship it", &WriteOptions::default().tags(["work"]))
//!     .await?;
//! assert_eq!(first.version, 1);
//!
//! let second = writer.write("/work/plan", "# Plan\nship it today", &WriteOptions::default()).await?;
//! assert_eq!(second.previous_version, Some(1));
//!
//! let doc = Reader::new(&store).read("/work/plan").await?;
//! assert_eq!(doc.into_inner().map(|d| d.version), Some(2));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **[`domain`]**: documents, versions, paths, titles and tags
//! - **[`store`]**: the SQLite pool, schema, configuration and path locks
//! - **[`write`]**: create-or-update with history
//! - **[`read`]**: latest or historical reads
//! - **[`search`]**: full-text and list-all search
//! - **[`index`]**: listings with folders and tag counts
//! - **[`trash`]**: the soft-delete lifecycle
//! - **[`error`]**: unified error handling throughout the library
//!
//! ## Error Handling
//!
//! Fallible operations return [`DocstoreResult<T>`] wrapping [`DocstoreError`].
//! Validation errors from [`domain`] convert automatically, so `?` works
//! throughout. Trash operations report refused transitions in their outcome
//! instead of failing.

pub mod domain;
pub mod error;
pub mod index;
pub mod read;
pub mod search;
pub mod store;
pub mod trash;
pub mod write;

/// Re-exports the most commonly used types for convenience.
pub use error::{DocstoreError, DocstoreResult};
