//! Resource and field paths.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Reserved field name that resolves to the document's own key.
pub const DOCUMENT_ID_FIELD: &str = "__name__";

/// Slash-separated path to a collection or document, e.g. `users/alice/posts`.
///
/// Ordering compares segments one by one (byte order), then segment count,
/// which is the implicit document-key order of a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ResourcePath(Vec<String>);

impl ResourcePath {
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a slash-separated path. Leading and trailing slashes are ignored;
    /// empty inner segments are rejected.
    pub fn parse(path: &str) -> PipelineResult<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(PipelineError::InvalidDocumentPath(path.to_string()));
            }
            segments.push(segment.to_string());
        }
        Ok(Self(segments))
    }

    /// Parse a path that must name a document (even segment count).
    pub fn document(path: &str) -> PipelineResult<Self> {
        let parsed = Self::parse(path)?;
        if !parsed.is_document_key() {
            return Err(PipelineError::InvalidDocumentPath(path.to_string()));
        }
        Ok(parsed)
    }

    /// Parse a path that must name a collection (odd segment count).
    pub fn collection(path: &str) -> PipelineResult<Self> {
        let parsed = Self::parse(path)
            .map_err(|_| PipelineError::InvalidCollectionPath(path.to_string()))?;
        if !parsed.is_collection() {
            return Err(PipelineError::InvalidCollectionPath(path.to_string()));
        }
        Ok(parsed)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_document_key(&self) -> bool {
        !self.0.is_empty() && self.0.len() % 2 == 0
    }

    pub fn is_collection(&self) -> bool {
        self.0.len() % 2 == 1
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<ResourcePath> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// For a document key, the id of the collection holding it.
    pub fn collection_id(&self) -> Option<&str> {
        if self.0.len() < 2 {
            return None;
        }
        Some(&self.0[self.0.len() - 2])
    }

    /// True if `self` sits exactly one level below `parent`.
    pub fn is_immediate_child_of(&self, parent: &ResourcePath) -> bool {
        self.0.len() == parent.0.len() + 1 && self.0.starts_with(&parent.0)
    }

    pub fn child(&self, segment: impl Into<String>) -> ResourcePath {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Dot-separated path to a (possibly nested) document field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn from_segments<I, S>(segments: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(PipelineError::InvalidFieldPath(segments.join(".")));
        }
        Ok(Self(segments))
    }

    /// Parse `a.b.c`. A segment wrapped in backticks may contain dots; inside
    /// backticks a backslash escapes the next character.
    pub fn parse(path: &str) -> PipelineResult<Self> {
        let invalid = || PipelineError::InvalidFieldPath(path.to_string());
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut chars = path.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' if quoted => current.push(chars.next().ok_or_else(invalid)?),
                '`' => quoted = !quoted,
                '.' if !quoted => {
                    if current.is_empty() {
                        return Err(invalid());
                    }
                    segments.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            }
        }

        if quoted || current.is_empty() {
            return Err(invalid());
        }
        segments.push(current);
        Ok(Self(segments))
    }

    /// The reserved `__name__` path.
    pub fn document_id() -> Self {
        Self(vec![DOCUMENT_ID_FIELD.to_string()])
    }

    pub fn is_document_id(&self) -> bool {
        self.0.len() == 1 && self.0[0] == DOCUMENT_ID_FIELD
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Canonical string form, quoting segments that need it.
    pub fn canonical_string(&self) -> String {
        self.0
            .iter()
            .map(|segment| {
                let simple = !segment.is_empty()
                    && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    && !segment.starts_with(|c: char| c.is_ascii_digit());
                if simple {
                    segment.clone()
                } else {
                    format!("`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_path_parse() {
        let path = ResourcePath::parse("users/alice/posts/p1").unwrap();
        assert_eq!(path.len(), 4);
        assert!(path.is_document_key());
        assert_eq!(path.collection_id(), Some("posts"));
        assert_eq!(path.to_string(), "users/alice/posts/p1");
        assert!(ResourcePath::parse("users//alice").is_err());
    }

    #[test]
    fn test_document_and_collection_paths() {
        assert!(ResourcePath::document("users/alice").is_ok());
        assert!(ResourcePath::document("users").is_err());
        assert!(ResourcePath::collection("users").is_ok());
        assert!(ResourcePath::collection("users/alice").is_err());
    }

    #[test]
    fn test_immediate_child() {
        let users = ResourcePath::collection("users").unwrap();
        let alice = ResourcePath::document("users/alice").unwrap();
        let post = ResourcePath::document("users/alice/posts/p1").unwrap();
        assert!(alice.is_immediate_child_of(&users));
        assert!(!post.is_immediate_child_of(&users));
    }

    #[test]
    fn test_path_ordering_is_segment_wise() {
        let a = ResourcePath::parse("users/a").unwrap();
        let a_child = ResourcePath::parse("users/a/posts/x").unwrap();
        let b = ResourcePath::parse("users/b").unwrap();
        let dash = ResourcePath::parse("users-other/a").unwrap();
        assert!(a < a_child);
        assert!(a_child < b);
        // A flat string compare would put "users-other/a" first.
        assert!(b < dash);
    }

    #[test]
    fn test_field_path_parse() {
        let path = FieldPath::parse("address.city").unwrap();
        assert_eq!(path.segments(), &["address".to_string(), "city".to_string()]);

        let quoted = FieldPath::parse("`a.b`.c").unwrap();
        assert_eq!(quoted.segments(), &["a.b".to_string(), "c".to_string()]);
        assert_eq!(quoted.to_string(), "`a.b`.c");

        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse("a.").is_err());
        assert!(FieldPath::parse("`unterminated").is_err());
    }

    #[test]
    fn test_document_id_path() {
        assert!(FieldPath::parse("__name__").unwrap().is_document_id());
        assert!(FieldPath::document_id().is_document_id());
        assert!(!FieldPath::parse("name").unwrap().is_document_id());
    }
}
