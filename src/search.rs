//! Full-text and list-all search over active documents.
//!
//! Search runs on SQLite's FTS5 extension. Both query paths share the same
//! structural filters (folder prefix, source, type) and the same in-memory
//! tag intersection.
//!
//! # Usage
//!
//! ```rust,no_run
//! use docstore_core::search::{Query, SearchOptions};
//! use docstore_core::store::Store;
//!
//! # async fn run() -> docstore_core::DocstoreResult<()> {
//! let store = Store::open_at("/tmp/docs.db").await?;
//! let query = Query::new(&store);
//!
//! // Everything under /work, newest first
//! let page = query
//!     .search("*", &SearchOptions { folder: Some("/work".into()), ..Default::default() })
//!     .await?;
//!
//! // Ranked full-text search restricted to two tags
//! let options = SearchOptions {
//!     tags: vec!["rust".into(), "async".into()],
//!     limit: Some(10),
//!     ..Default::default()
//! };
//! let page = query.search("\"error handling\" OR tokio*", &options).await?;
//! println!("{} of {} hits", page.documents.len(), page.total);
//! # Ok(())
//! # }
//! ```

pub(crate) mod filter;
mod fts;
pub mod query;

pub use query::{Query, SearchOptions, SearchPage, SearchResult};
