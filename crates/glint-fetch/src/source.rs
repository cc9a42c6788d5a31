//! Document access for the fetch phase.
//!
//! A [`DocumentSource`] is the fetch phase's only view of the index: stored values,
//! the `_source` document, term vectors, the `_uid` of a document and the term
//! dictionary of a segment.

use std::{fmt, str::FromStr};

use glint_highlight::TermVector;
use glint_query::{DocAddress, SegmentOrd, TermRewriter};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SourceError;

/// Separator between type and id in a stored `_uid`.
const UID_SEPARATOR: char = '#';

/// Type and id of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uid {
    /// Document type.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Document id, unique within its type.
    pub id: String,
}

impl Uid {
    /// Creates a uid.
    pub fn new(doc_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{UID_SEPARATOR}{}", self.doc_type, self.id)
    }
}

impl FromStr for Uid {
    type Err = SourceError;

    /// Parses a stored `type#id` uid. The id may itself contain `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(UID_SEPARATOR) {
            Some((doc_type, id)) if !doc_type.is_empty() => Ok(Self::new(doc_type, id)),
            _ => Err(SourceError::InvalidUid(s.to_string())),
        }
    }
}

/// A hit to fetch: where it lives and what it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRef {
    /// Address of the document.
    pub address: DocAddress,
    /// Type and id of the document.
    pub uid: Uid,
}

impl DocRef {
    /// Creates a document reference.
    pub fn new(address: DocAddress, uid: Uid) -> Self {
        Self { address, uid }
    }

    /// Resolves the type and id of the document at `address`.
    pub fn resolve(address: DocAddress, source: &dyn DocumentSource) -> Result<Self, SourceError> {
        Ok(Self::new(address, source.uid(address)?))
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] (segment {} doc {})",
            self.uid, self.address.segment, self.address.doc_id
        )
    }
}

/// Read access to stored documents.
///
/// Implementations are shared by every worker of a fetch and must not change
/// while it runs.
pub trait DocumentSource: Sync {
    /// Returns the stored values of a field, in stored order.
    fn stored_values(&self, doc: DocAddress, field: &str) -> Result<Vec<String>, SourceError>;

    /// Returns the `_source` document, if the index keeps one.
    fn source(&self, doc: DocAddress) -> Result<Option<Value>, SourceError>;

    /// Returns the term vector of a field, if the index stored one.
    fn term_vector(&self, doc: DocAddress, field: &str)
    -> Result<Option<TermVector>, SourceError>;

    /// Returns the type and id of a document.
    fn uid(&self, doc: DocAddress) -> Result<Uid, SourceError>;

    /// Returns the term dictionary of a segment, for multi-term rewriting.
    fn rewriter(&self, segment: SegmentOrd) -> Option<&dyn TermRewriter>;
}

/// Extracts the values at a dotted path of a `_source` document.
///
/// Arrays are flattened at every level; strings are taken as is, numbers and
/// booleans in their JSON form, nulls and objects are skipped.
pub fn source_values(source: &Value, path: &str) -> Vec<String> {
    let mut values = Vec::new();
    let segments: Vec<&str> = path.split('.').collect();
    collect_values(source, &segments, &mut values);
    values
}

/// Walks `path` below `node`, pushing every leaf value found.
fn collect_values(node: &Value, path: &[&str], out: &mut Vec<String>) {
    if let Value::Array(items) = node {
        for item in items {
            collect_values(item, path, out);
        }
        return;
    }

    match path.split_first() {
        Some((key, rest)) => {
            if let Some(child) = node.get(*key) {
                collect_values(child, rest, out);
            }
        }
        None => match node {
            Value::String(s) => out.push(s.clone()),
            Value::Number(n) => out.push(n.to_string()),
            Value::Bool(b) => out.push(b.to_string()),
            Value::Null | Value::Object(_) | Value::Array(_) => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn uid_round_trips_through_display() {
        let uid: Uid = "comment#c-1#2".parse().unwrap();
        assert_eq!(uid, Uid::new("comment", "c-1#2"));
        assert_eq!(uid.to_string(), "comment#c-1#2");
    }

    #[test]
    fn uid_without_type_is_rejected() {
        assert!(matches!("#1".parse::<Uid>(), Err(SourceError::InvalidUid(_))));
        assert!(matches!("plain".parse::<Uid>(), Err(SourceError::InvalidUid(_))));
    }

    #[test]
    fn source_values_follow_dotted_paths() {
        let source = json!({
            "title": "Rust",
            "author": {"name": "Ferris", "age": 7},
            "tags": ["a", "b"],
            "comments": [{"text": "first"}, {"text": "second"}, {"other": 1}],
        });

        assert_eq!(source_values(&source, "title"), vec!["Rust"]);
        assert_eq!(source_values(&source, "author.name"), vec!["Ferris"]);
        assert_eq!(source_values(&source, "author.age"), vec!["7"]);
        assert_eq!(source_values(&source, "tags"), vec!["a", "b"]);
        assert_eq!(source_values(&source, "comments.text"), vec!["first", "second"]);
    }

    #[test]
    fn source_values_skip_missing_and_objects() {
        let source = json!({"author": {"name": null}});
        assert!(source_values(&source, "author").is_empty());
        assert!(source_values(&source, "author.name").is_empty());
        assert!(source_values(&source, "missing.path").is_empty());
    }
}
