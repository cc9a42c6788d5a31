//! Child hits gathered for relational clauses.
//!
//! The query executor fills a [`ChildHitIndex`] while it scores a relational clause:
//! for every parent that matched, the ordered children that satisfied the child
//! predicate. The fetch phase only ever reads it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Segment-local document number.
pub type DocId = u32;

/// Ordinal of an index segment within a searcher.
pub type SegmentOrd = u32;

/// Address of a document: its segment and its segment-local number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocAddress {
    /// Segment ordinal.
    pub segment: SegmentOrd,
    /// Segment-local document number.
    pub doc_id: DocId,
}

impl DocAddress {
    /// Creates a document address.
    pub fn new(segment: SegmentOrd, doc_id: DocId) -> Self {
        Self { segment, doc_id }
    }
}

/// A child document that satisfied a relational clause's child predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildHit {
    /// Segment-local number of the child document.
    pub doc_id: DocId,
    /// Segment the child lives in (may differ from the parent's).
    pub segment: SegmentOrd,
}

impl ChildHit {
    /// Creates a child hit.
    pub fn new(segment: SegmentOrd, doc_id: DocId) -> Self {
        Self { doc_id, segment }
    }

    /// Returns the address of the child document.
    pub fn address(&self) -> DocAddress {
        DocAddress::new(self.segment, self.doc_id)
    }
}

/// Parent address to the ordered child hits that made it match.
///
/// A parent with no entry contributed no children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildHitIndex {
    /// Child hits per parent, in executor order.
    by_parent: HashMap<DocAddress, Vec<ChildHit>>,
}

impl ChildHitIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a child hit to a parent's list.
    pub fn push(&mut self, parent: DocAddress, child: ChildHit) {
        self.by_parent.entry(parent).or_default().push(child);
    }

    /// Returns the child hits of a parent, empty if it has none.
    pub fn get(&self, parent: DocAddress) -> &[ChildHit] {
        self.by_parent.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if the parent has an entry.
    pub fn contains(&self, parent: DocAddress) -> bool {
        self.by_parent.contains_key(&parent)
    }

    /// Number of parents with child hits.
    pub fn len(&self) -> usize {
        self.by_parent.len()
    }

    /// Returns true if no parent has child hits.
    pub fn is_empty(&self) -> bool {
        self.by_parent.is_empty()
    }

    /// Keeps at most `limit` child hits per parent.
    pub fn truncate_each(&mut self, limit: usize) {
        for hits in self.by_parent.values_mut() {
            hits.truncate(limit);
        }
    }
}

impl FromIterator<(DocAddress, ChildHit)> for ChildHitIndex {
    fn from_iter<I: IntoIterator<Item = (DocAddress, ChildHit)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (parent, child) in iter {
            index.push(parent, child);
        }
        index
    }
}
