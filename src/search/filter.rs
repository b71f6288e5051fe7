//! One query builder for every listing: list-all, full-text, index and
//! trash all compose the same structural filters.

use crate::domain::DocumentPath;
use crate::search::fts::FtsQuery;
use sqlx::{QueryBuilder, Sqlite};

/// Which lifecycle state a listing selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Visibility {
    #[default]
    Active,
    Trashed,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DocumentFilter {
    pub folder: Option<DocumentPath>,
    pub source: Option<String>,
    pub doc_type: Option<String>,
    /// Prepared full-text condition. A match switches the query onto the
    /// full-text index; an exclusion filters the plain table against it.
    pub text: Option<FtsQuery>,
    pub visibility: Visibility,
}

impl DocumentFilter {
    pub(crate) fn new(
        folder: Option<&str>,
        source: Option<&str>,
        doc_type: Option<&str>,
    ) -> Self {
        Self {
            folder: folder.and_then(DocumentPath::folder),
            source: non_blank(source),
            doc_type: non_blank(doc_type),
            ..Default::default()
        }
    }

    pub(crate) fn with_text(mut self, text: Option<FtsQuery>) -> Self {
        self.text = text;
        self
    }

    pub(crate) fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// True when rows come from the full-text index and carry rank and
    /// highlighted snippets.
    pub(crate) fn is_ranked(&self) -> bool {
        matches!(self.text, Some(FtsQuery::Match(_)))
    }

    /// `SELECT {columns} FROM ... WHERE ...`; ordering and paging are left to
    /// the caller.
    pub(crate) fn select(&self, columns: &str) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(columns);
        self.push_from_where(&mut qb);
        qb
    }

    pub(crate) fn count(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*)");
        self.push_from_where(&mut qb);
        qb
    }

    fn push_from_where(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        match &self.text {
            Some(FtsQuery::Match(expr)) => {
                qb.push(
                    " FROM documents_fts JOIN documents d ON d.seq = documents_fts.rowid \
                     WHERE documents_fts MATCH ",
                );
                qb.push_bind(expr.clone());
            }
            Some(FtsQuery::Exclude(expr)) => {
                qb.push(
                    " FROM documents d WHERE d.seq NOT IN \
                     (SELECT rowid FROM documents_fts WHERE documents_fts MATCH ",
                );
                qb.push_bind(expr.clone()).push(")");
            }
            None => {
                qb.push(" FROM documents d WHERE 1 = 1");
            }
        }

        qb.push(match self.visibility {
            Visibility::Active => " AND d.deleted_at IS NULL",
            Visibility::Trashed => " AND d.deleted_at IS NOT NULL",
        });

        if let Some(folder) = &self.folder {
            let prefix = folder.child_prefix();
            qb.push(" AND (d.path = ")
                .push_bind(folder.to_string())
                .push(" OR substr(d.path, 1, ")
                .push_bind(prefix.chars().count() as i64)
                .push(") = ")
                .push_bind(prefix)
                .push(")");
        }

        if let Some(source) = &self.source {
            qb.push(" AND d.source = ").push_bind(source.clone());
        }

        if let Some(doc_type) = &self.doc_type {
            qb.push(" AND d.doc_type = ").push_bind(doc_type.clone());
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
