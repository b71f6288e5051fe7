//! Document types and the validation rules shared by every engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub use path::DocumentPath;

pub(crate) mod path;

pub(crate) const UNTITLED: &str = "Untitled";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("path must not be empty")]
    EmptyPath,
    #[error("content must not be empty")]
    EmptyContent,
}

/// Opaque identifier assigned when a document is first created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub(crate) fn generate() -> Self {
        DocumentId(Uuid::new_v4())
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(DocumentId)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value.into())
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Lifecycle state of a document.
///
/// A trashed document keeps its row (and its history) until it is restored,
/// permanently deleted, or overwritten by a write to the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DocumentState {
    Active,
    Trashed { deleted_at: DateTime<Utc> },
}

impl DocumentState {
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(deleted_at) => DocumentState::Trashed { deleted_at },
            None => DocumentState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DocumentState::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            DocumentState::Active => None,
            DocumentState::Trashed { deleted_at } => Some(*deleted_at),
        }
    }
}

/// The live, addressable unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub path: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub metadata: Option<Metadata>,
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: DocumentState,
}

impl Document {
    /// Drops the content, keeping what listings show.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary::from(self)
    }

    /// Returns true when every tag in `required` is carried by this document.
    pub fn has_all_tags(&self, required: &[String]) -> bool {
        has_all_tags(&self.tags, required)
    }
}

/// Snapshot of a document's state before the update that superseded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    pub document_id: DocumentId,
    pub version: i64,
    pub content: String,
    pub metadata: Option<Metadata>,
    pub created_at: DateTime<Utc>,
}

/// Content-free projection used by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub path: String,
    pub title: String,
    pub tags: Vec<String>,
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        DocumentSummary {
            id: doc.id,
            path: doc.path.clone(),
            title: doc.title.clone(),
            tags: doc.tags.clone(),
            source: doc.source.clone(),
            doc_type: doc.doc_type.clone(),
            version: doc.version,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            deleted_at: doc.state.deleted_at(),
        }
    }
}

pub(crate) fn has_all_tags(tags: &[String], required: &[String]) -> bool {
    required.iter().all(|t| tags.iter().any(|have| have == t))
}

/// Trims tags, drops empty ones and removes duplicates keeping the first.
pub fn clean_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_owned());
        }
    }
    cleaned
}

/// Picks a title for a new document.
///
/// An explicit non-blank title wins, then the first Markdown heading in the
/// content, then the last path segment.
pub fn resolve_title(explicit: Option<&str>, content: &str, path: &DocumentPath) -> String {
    if let Some(title) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_owned();
    }

    if let Some(heading) = heading_title(content) {
        return heading;
    }

    match path.name() {
        "" => UNTITLED.to_owned(),
        name => name.to_owned(),
    }
}

/// First ATX heading: one to six `#` followed by whitespace and text.
fn heading_title(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.trim();
        let text = line.trim_start_matches('#');
        let level = line.len() - text.len();
        if !(1..=6).contains(&level) || !text.starts_with(char::is_whitespace) {
            return None;
        }
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    })
}

/// Validates write input; the content itself is stored untouched.
pub(crate) fn validate_content(content: &str) -> Result<(), DocumentError> {
    if content.trim().is_empty() {
        return Err(DocumentError::EmptyContent);
    }
    Ok(())
}
