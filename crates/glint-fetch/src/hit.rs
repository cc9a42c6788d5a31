//! Per-hit fetch results.

use std::collections::BTreeMap;

use glint_highlight::HighlightOffsets;
use serde::{Deserialize, Serialize};

/// Highlighted fragments of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightField {
    /// Field name.
    pub name: String,
    /// Fragments in response order.
    pub fragments: Vec<String>,
}

impl HighlightField {
    /// Creates a highlight field.
    pub fn new(name: impl Into<String>, fragments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fragments,
        }
    }
}

/// A child document attached to a parent hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildrenResult {
    /// Child document type.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Child document id.
    pub id: String,
    /// Highlighted fields of the child, by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub highlight_fields: BTreeMap<String, HighlightField>,
}

/// Everything the fetch phase adds to one hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitHighlights {
    /// Hit document type.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Hit document id.
    pub id: String,
    /// Highlighted fields, by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, HighlightField>,
    /// Match offsets of the fields highlighted in offsets-only mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets: Option<BTreeMap<String, Vec<HighlightOffsets>>>,
    /// Child documents, when children were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ChildrenResult>>,
}

impl HitHighlights {
    /// Creates an empty result for a hit.
    pub fn new(doc_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    /// Records the offsets of a field.
    pub fn insert_offsets(&mut self, field: &str, offsets: Vec<HighlightOffsets>) {
        self.offsets
            .get_or_insert_with(BTreeMap::new)
            .insert(field.to_string(), offsets);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_without_empty_parts() {
        let mut hit = HitHighlights::new("post", "1");
        hit.fields.insert(
            String::from("title"),
            HighlightField::new("title", vec![String::from("<em>rust</em>")]),
        );

        assert_eq!(
            serde_json::to_value(&hit).unwrap(),
            json!({
                "type": "post",
                "id": "1",
                "fields": {"title": {"name": "title", "fragments": ["<em>rust</em>"]}},
            })
        );
    }

    #[test]
    fn offsets_accumulate_per_field() {
        let mut hit = HitHighlights::new("post", "1");
        hit.insert_offsets("body", vec![HighlightOffsets::new(0, 4)]);
        hit.insert_offsets("title", vec![]);

        let offsets = hit.offsets.unwrap();
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets["body"], vec![HighlightOffsets::new(0, 4)]);
    }
}
