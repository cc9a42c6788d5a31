//! In-memory document source.
//!
//! Documents are grouped in segments the same way an on-disk index groups them, so
//! addresses, per-segment term dictionaries and cross-segment children behave like
//! they do against Tantivy. Used by the CLI fixtures and by tests.

use std::collections::{BTreeMap, BTreeSet};

use glint_highlight::{TermVector, tokenize};
use glint_query::{DocAddress, RewriteError, SegmentOrd, TermPattern, TermRewriter};
use serde::Deserialize;
use serde_json::Value;
use tantivy::tokenizer::TextAnalyzer;
use tracing::trace;

use crate::{
    DocumentMappings, DocumentSource, SourceError, Uid,
    expand::{Expansion, fuzzy_dfa, fuzzy_matches, literal_prefix, wildcard_matches},
    source_values,
};

/// A document as it is handed to [`MemoryStore::add_document`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredDocument {
    /// Type and id.
    pub uid: Uid,
    /// Stored field values.
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
    /// The original document.
    #[serde(default)]
    pub source: Option<Value>,
}

/// A document once indexed.
#[derive(Debug)]
struct IndexedDocument {
    /// Type and id.
    uid: Uid,
    /// Stored field values.
    stored: BTreeMap<String, Vec<String>>,
    /// The original document.
    source: Option<Value>,
    /// Term vectors of the fields mapped with them.
    vectors: BTreeMap<String, TermVector>,
}

/// Sorted term dictionary of one segment, per field.
#[derive(Debug, Default)]
struct SegmentTerms {
    /// Field to its indexed terms.
    fields: BTreeMap<String, BTreeSet<String>>,
}

impl SegmentTerms {
    /// Terms of `field` starting with `prefix`, in order.
    fn with_prefix<'a>(&'a self, field: &str, prefix: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(move |terms| terms.range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded)))
            .map(String::as_str)
            .take_while(move |term| term.starts_with(prefix))
    }
}

impl TermRewriter for SegmentTerms {
    fn expand(
        &self,
        field: &str,
        pattern: &TermPattern<'_>,
        max_terms: usize,
    ) -> Result<Vec<String>, RewriteError> {
        let mut expansion = Expansion::new(field, pattern, max_terms);
        match *pattern {
            TermPattern::Prefix(prefix) => {
                for term in self.with_prefix(field, prefix) {
                    expansion.push(term)?;
                }
            }
            TermPattern::Wildcard(wildcard) => {
                let matching = self
                    .with_prefix(field, literal_prefix(wildcard))
                    .filter(|term| wildcard_matches(wildcard, term));
                for term in matching {
                    expansion.push(term)?;
                }
            }
            TermPattern::Fuzzy { term, distance } => {
                let dfa = fuzzy_dfa(term, distance)?;
                let matching = self
                    .with_prefix(field, "")
                    .filter(|candidate| fuzzy_matches(&dfa, candidate));
                for candidate in matching {
                    expansion.push(candidate)?;
                }
            }
        }
        Ok(expansion.finish())
    }
}

/// Documents of one segment with their term dictionary.
#[derive(Debug, Default)]
struct MemorySegment {
    /// Documents by segment-local number.
    documents: Vec<IndexedDocument>,
    /// Term dictionary.
    terms: SegmentTerms,
}

/// A [`DocumentSource`] held entirely in memory.
pub struct MemoryStore {
    /// Analyzer used to index terms and build term vectors.
    analyzer: TextAnalyzer,
    /// Field mappings per document type.
    mappings: DocumentMappings,
    /// Segments by ordinal.
    segments: Vec<MemorySegment>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new(analyzer: TextAnalyzer, mappings: DocumentMappings) -> Self {
        Self {
            analyzer,
            mappings,
            segments: Vec::new(),
        }
    }

    /// Returns the field mappings documents are indexed with.
    pub fn mappings(&self) -> &DocumentMappings {
        &self.mappings
    }

    /// Number of documents across all segments.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.documents.len()).sum()
    }

    /// Returns true if the store holds no document.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indexes a document at the end of a segment and returns its address.
    ///
    /// Every field its type maps is indexed, from the stored values when the field
    /// is stored and from `_source` otherwise.
    pub fn add_document(&mut self, segment: SegmentOrd, doc: StoredDocument) -> DocAddress {
        let ord = segment as usize;
        if self.segments.len() <= ord {
            self.segments.resize_with(ord + 1, MemorySegment::default);
        }

        let mut vectors = BTreeMap::new();
        let target = &mut self.segments[ord];
        for (field, mapping) in self.mappings.fields(&doc.uid.doc_type) {
            let values = if mapping.stored {
                doc.fields.get(field).cloned().unwrap_or_default()
            } else {
                doc.source
                    .as_ref()
                    .map(|source| source_values(source, field))
                    .unwrap_or_default()
            };

            let dictionary = target.terms.fields.entry(field.to_string()).or_default();
            for (i, value) in values.iter().enumerate() {
                for occurrence in tokenize(&self.analyzer, i, value) {
                    dictionary.insert(occurrence.term);
                }
            }
            if mapping.term_vectors {
                vectors.insert(
                    field.to_string(),
                    TermVector::from_values(&self.analyzer, &values),
                );
            }
        }

        let doc_id = target.documents.len() as u32;
        trace!(uid = %doc.uid, segment, doc_id, "indexed document");
        target.documents.push(IndexedDocument {
            uid: doc.uid,
            stored: doc.fields,
            source: doc.source,
            vectors,
        });
        DocAddress::new(segment, doc_id)
    }

    /// Returns the document at an address.
    fn document(&self, doc: DocAddress) -> Result<&IndexedDocument, SourceError> {
        self.segments
            .get(doc.segment as usize)
            .and_then(|segment| segment.documents.get(doc.doc_id as usize))
            .ok_or(SourceError::MissingDocument(doc))
    }
}

impl DocumentSource for MemoryStore {
    fn stored_values(&self, doc: DocAddress, field: &str) -> Result<Vec<String>, SourceError> {
        Ok(self
            .document(doc)?
            .stored
            .get(field)
            .cloned()
            .unwrap_or_default())
    }

    fn source(&self, doc: DocAddress) -> Result<Option<Value>, SourceError> {
        Ok(self.document(doc)?.source.clone())
    }

    fn term_vector(
        &self,
        doc: DocAddress,
        field: &str,
    ) -> Result<Option<TermVector>, SourceError> {
        Ok(self.document(doc)?.vectors.get(field).cloned())
    }

    fn uid(&self, doc: DocAddress) -> Result<Uid, SourceError> {
        Ok(self.document(doc)?.uid.clone())
    }

    fn rewriter(&self, segment: SegmentOrd) -> Option<&dyn TermRewriter> {
        self.segments
            .get(segment as usize)
            .map(|s| &s.terms as &dyn TermRewriter)
    }
}

#[cfg(test)]
mod tests {
    use glint_highlight::build_analyzer_from_name;
    use serde_json::json;

    use super::*;
    use crate::FieldMapping;

    /// A store with posts in segment 0 and comments in segment 1.
    fn store() -> MemoryStore {
        let mappings = DocumentMappings::new()
            .with(
                "post",
                "title",
                FieldMapping {
                    stored: true,
                    term_vectors: true,
                },
            )
            .with("post", "body", FieldMapping::default())
            .with("comment", "text", FieldMapping::default());
        let mut store = MemoryStore::new(build_analyzer_from_name("english").unwrap(), mappings);

        store.add_document(
            0,
            StoredDocument {
                uid: Uid::new("post", "1"),
                fields: BTreeMap::from([(
                    String::from("title"),
                    vec![String::from("Rusty tools")],
                )]),
                source: Some(json!({"body": "rustic rust and rusting"})),
            },
        );
        store.add_document(
            1,
            StoredDocument {
                uid: Uid::new("comment", "c1"),
                fields: BTreeMap::new(),
                source: Some(json!({"text": "trust the test"})),
            },
        );
        store
    }

    #[test]
    fn addresses_are_per_segment() {
        let store = store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.uid(DocAddress::new(1, 0)).unwrap(), Uid::new("comment", "c1"));
        assert!(matches!(
            store.uid(DocAddress::new(1, 1)),
            Err(SourceError::MissingDocument(_))
        ));
        assert!(matches!(
            store.uid(DocAddress::new(4, 0)),
            Err(SourceError::MissingDocument(_))
        ));
    }

    #[test]
    fn term_vectors_only_for_mapped_fields() {
        let store = store();
        let doc = DocAddress::new(0, 0);
        let vector = store.term_vector(doc, "title").unwrap().unwrap();
        assert_eq!(vector.occurrences.len(), 2);
        assert!(store.term_vector(doc, "body").unwrap().is_none());
    }

    #[test]
    fn prefix_expands_within_segment() {
        let store = store();
        let rewriter = store.rewriter(0).unwrap();
        let terms = rewriter
            .expand("body", &TermPattern::Prefix("rust"), 10)
            .unwrap();
        assert_eq!(terms, vec!["rust", "rustic"]);

        let other = store.rewriter(1).unwrap();
        assert!(
            other
                .expand("body", &TermPattern::Prefix("rust"), 10)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn wildcard_and_fuzzy_expand() {
        let store = store();
        let rewriter = store.rewriter(1).unwrap();
        assert_eq!(
            rewriter
                .expand("text", &TermPattern::Wildcard("t?st"), 10)
                .unwrap(),
            vec!["test"]
        );
        assert_eq!(
            rewriter
                .expand(
                    "text",
                    &TermPattern::Fuzzy {
                        term: "trest",
                        distance: 1
                    },
                    10
                )
                .unwrap(),
            vec!["test", "trust"]
        );
    }

    #[test]
    fn expansion_is_bounded() {
        let store = store();
        let rewriter = store.rewriter(0).unwrap();
        assert!(matches!(
            rewriter.expand("body", &TermPattern::Prefix(""), 2),
            Err(RewriteError::TooManyClauses { limit: 2, .. })
        ));
    }
}
