use super::DocumentError;
use std::fmt;

const SEPARATOR: char = '/';

/// A normalized hierarchical document path such as `/work/notes/x`.
///
/// Always starts with `/`, never ends with one, and never contains empty
/// segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Normalizes `raw` into a document path.
    ///
    /// Returns [`DocumentError::EmptyPath`] when nothing but whitespace or
    /// separators is left.
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        normalize(raw).map(DocumentPath).ok_or(DocumentError::EmptyPath)
    }

    /// Normalizes a folder filter. The root folder and blank input mean
    /// "no filter" and yield `None`.
    pub fn folder(raw: &str) -> Option<Self> {
        normalize(raw).map(DocumentPath)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or_default()
    }

    /// Every ancestor folder, outermost first. `/a/b/c` yields `/a` and `/a/b`.
    pub fn ancestors(&self) -> Vec<String> {
        ancestors_of(&self.0)
    }

    /// Prefix shared by every path nested below this one.
    pub(crate) fn child_prefix(&self) -> String {
        format!("{}{}", self.0, SEPARATOR)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn normalize(raw: &str) -> Option<String> {
    let segments: Vec<&str> = raw
        .trim()
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(raw.len() + 1);
    for segment in segments {
        normalized.push(SEPARATOR);
        normalized.push_str(segment);
    }
    Some(normalized)
}

/// Ancestor folders of an already-normalized path string.
pub(crate) fn ancestors_of(path: &str) -> Vec<String> {
    path.match_indices(SEPARATOR)
        .map(|(i, _)| i)
        .filter(|&i| i > 0)
        .map(|i| path[..i].to_owned())
        .collect()
}
