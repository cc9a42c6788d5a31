//! Field mappings per document type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a field of a document type is indexed and stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Values are kept in a stored field; otherwise they come from `_source`.
    pub stored: bool,
    /// A term vector with positions and offsets is indexed for the field.
    pub term_vectors: bool,
}

/// Outcome of resolving a field for a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingLookup<'a> {
    /// The type maps the field.
    Found(&'a FieldMapping),
    /// Only other types map the field.
    OtherType,
    /// No type maps the field.
    Missing,
}

/// Field mappings of every document type of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentMappings {
    /// Type name to field name to mapping.
    types: BTreeMap<String, BTreeMap<String, FieldMapping>>,
}

impl DocumentMappings {
    /// Creates an empty set of mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the mapping of a field.
    pub fn insert(&mut self, doc_type: &str, field: &str, mapping: FieldMapping) {
        self.types
            .entry(doc_type.to_string())
            .or_default()
            .insert(field.to_string(), mapping);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, doc_type: &str, field: &str, mapping: FieldMapping) -> Self {
        self.insert(doc_type, field, mapping);
        self
    }

    /// Resolves `field` for a document of type `doc_type`.
    pub fn lookup(&self, doc_type: &str, field: &str) -> MappingLookup<'_> {
        if let Some(mapping) = self.types.get(doc_type).and_then(|f| f.get(field)) {
            return MappingLookup::Found(mapping);
        }
        if self.types.values().any(|fields| fields.contains_key(field)) {
            MappingLookup::OtherType
        } else {
            MappingLookup::Missing
        }
    }

    /// Returns the mapping of `field` for `doc_type`, if the type maps it.
    pub fn get(&self, doc_type: &str, field: &str) -> Option<&FieldMapping> {
        match self.lookup(doc_type, field) {
            MappingLookup::Found(mapping) => Some(mapping),
            MappingLookup::OtherType | MappingLookup::Missing => None,
        }
    }

    /// Iterates the fields of a type with their mappings.
    pub fn fields(&self, doc_type: &str) -> impl Iterator<Item = (&str, &FieldMapping)> {
        self.types
            .get(doc_type)
            .into_iter()
            .flatten()
            .map(|(name, mapping)| (name.as_str(), mapping))
    }
}
