//! Row shapes as stored in SQLite and their decoding into domain types.

use crate::domain::{
    Document, DocumentId, DocumentState, DocumentSummary, DocumentVersion, Metadata,
};
use crate::error::{DocstoreError, DocstoreResult};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Columns selected for a full document row.
pub(crate) const DOCUMENT_COLUMNS: &str = "d.id AS id, d.path AS path, d.title AS title, \
     d.content AS content, d.tags AS tags, d.metadata AS metadata, d.source AS source, \
     d.doc_type AS doc_type, d.version AS version, d.created_at AS created_at, \
     d.updated_at AS updated_at, d.deleted_at AS deleted_at";

/// Columns selected for a content-free summary row.
pub(crate) const SUMMARY_COLUMNS: &str = "d.id AS id, d.path AS path, d.title AS title, \
     d.tags AS tags, d.source AS source, d.doc_type AS doc_type, d.version AS version, \
     d.created_at AS created_at, d.updated_at AS updated_at, d.deleted_at AS deleted_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DocumentRow {
    pub id: String,
    pub path: String,
    pub title: String,
    pub content: String,
    pub tags: String,
    pub metadata: Option<String>,
    pub source: Option<String>,
    pub doc_type: Option<String>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SummaryRow {
    pub id: String,
    pub path: String,
    pub title: String,
    pub tags: String,
    pub source: Option<String>,
    pub doc_type: Option<String>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct VersionRow {
    pub document_id: String,
    pub version: i64,
    pub content: String,
    pub metadata: Option<String>,
    pub created_at: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = DocstoreError;

    fn try_from(row: DocumentRow) -> DocstoreResult<Self> {
        Ok(Document {
            id: decode_id(&row.id)?,
            tags: decode_tags(&row.tags)?,
            metadata: decode_metadata(row.metadata.as_deref())?,
            created_at: decode_timestamp(&row.created_at)?,
            updated_at: decode_timestamp(&row.updated_at)?,
            state: DocumentState::from_deleted_at(
                row.deleted_at.as_deref().map(decode_timestamp).transpose()?,
            ),
            path: row.path,
            title: row.title,
            content: row.content,
            source: row.source,
            doc_type: row.doc_type,
            version: row.version,
        })
    }
}

impl TryFrom<SummaryRow> for DocumentSummary {
    type Error = DocstoreError;

    fn try_from(row: SummaryRow) -> DocstoreResult<Self> {
        Ok(DocumentSummary {
            id: decode_id(&row.id)?,
            tags: decode_tags(&row.tags)?,
            created_at: decode_timestamp(&row.created_at)?,
            updated_at: decode_timestamp(&row.updated_at)?,
            deleted_at: row.deleted_at.as_deref().map(decode_timestamp).transpose()?,
            path: row.path,
            title: row.title,
            source: row.source,
            doc_type: row.doc_type,
            version: row.version,
        })
    }
}

impl TryFrom<VersionRow> for DocumentVersion {
    type Error = DocstoreError;

    fn try_from(row: VersionRow) -> DocstoreResult<Self> {
        Ok(DocumentVersion {
            document_id: decode_id(&row.document_id)?,
            version: row.version,
            content: row.content,
            metadata: decode_metadata(row.metadata.as_deref())?,
            created_at: decode_timestamp(&row.created_at)?,
        })
    }
}

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so that text order matches time order.
pub(crate) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> DocstoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DocstoreError::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}

pub(crate) fn encode_tags(tags: &[String]) -> DocstoreResult<String> {
    Ok(serde_json::to_string(tags)?)
}

/// Missing or blank tag columns decode as an empty set.
pub(crate) fn decode_tags(raw: &str) -> DocstoreResult<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

pub(crate) fn encode_metadata(metadata: Option<&Metadata>) -> DocstoreResult<Option<String>> {
    metadata
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

pub(crate) fn decode_metadata(raw: Option<&str>) -> DocstoreResult<Option<Metadata>> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(None),
        Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
    }
}

fn decode_id(raw: &str) -> DocstoreResult<DocumentId> {
    DocumentId::parse(raw).ok_or_else(|| DocstoreError::Corrupt(format!("bad document id {raw:?}")))
}
