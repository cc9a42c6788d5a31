//! Document source over a Tantivy index.
//!
//! The index carries one stored `_uid` field (`type#id`), an optional stored
//! `_source` field holding the JSON document, and one text field per mapped field,
//! tokenized with the glint analyzer. Tantivy keeps no per-document term vectors, so
//! every field is highlighted by re-analysis.

use std::{path::Path, str};

use glint_highlight::{GLINT_TOKENIZER, TermVector};
use glint_query::{DocAddress, RewriteError, SegmentOrd, TermPattern, TermRewriter};
use serde_json::Value;
use tantivy::{
    Index, Searcher, SegmentReader, TantivyDocument,
    directory::MmapDirectory,
    schema::{
        Field, IndexRecordOption, STORED, STRING, Schema, SchemaBuilder, TextFieldIndexing,
        TextOptions, Value as _,
    },
    termdict::TermStreamer,
    tokenizer::TextAnalyzer,
};
use tantivy_fst::Automaton;
use tracing::debug;

use crate::{
    DocumentSource, SourceError, Uid,
    expand::{Expansion, LevenshteinDfa, fuzzy_dfa, literal_prefix, wildcard_matches},
};

/// Name of the stored type-and-id field.
pub const UID_FIELD: &str = "_uid";

/// Name of the stored JSON document field.
pub const SOURCE_FIELD: &str = "_source";

/// Options of a highlightable text field: tokenized with the glint analyzer,
/// positions indexed, stored.
pub fn text_field_options() -> TextOptions {
    TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(GLINT_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored()
}

/// Starts a schema with the `_uid` and `_source` fields in place.
pub fn schema_builder() -> SchemaBuilder {
    let mut builder = Schema::builder();
    builder.add_text_field(UID_FIELD, STRING | STORED);
    builder.add_text_field(SOURCE_FIELD, STORED);
    builder
}

/// Term dictionaries of one segment.
struct SegmentDictionary {
    /// Reader of the segment.
    reader: SegmentReader,
    /// Schema used to resolve field names.
    schema: Schema,
}

impl SegmentDictionary {
    /// Feeds every term of a stream into `expansion`, stopping at the first term
    /// for which `keep` returns `Stop`.
    fn collect<A>(
        field: &str,
        mut stream: TermStreamer<'_, A>,
        expansion: &mut Expansion<'_>,
        keep: impl Fn(&str) -> Step,
    ) -> Result<(), RewriteError>
    where
        A: Automaton,
        A::State: Clone,
    {
        while stream.advance() {
            let Ok(term) = str::from_utf8(stream.key()) else {
                debug!(field, "skipping non UTF-8 term");
                continue;
            };
            match keep(term) {
                Step::Take => expansion.push(term)?,
                Step::Skip => {}
                Step::Stop => break,
            }
        }
        Ok(())
    }
}

/// What to do with a streamed term.
enum Step {
    /// The term matches.
    Take,
    /// The term does not match; keep going.
    Skip,
    /// No later term can match.
    Stop,
}

impl TermRewriter for SegmentDictionary {
    fn expand(
        &self,
        field: &str,
        pattern: &TermPattern<'_>,
        max_terms: usize,
    ) -> Result<Vec<String>, RewriteError> {
        let Ok(handle) = self.schema.get_field(field) else {
            return Ok(Vec::new());
        };
        let inverted_index = self
            .reader
            .inverted_index(handle)
            .map_err(|e| RewriteError::term_dictionary(field, &e))?;
        let term_dict = inverted_index.terms();
        let mut expansion = Expansion::new(field, pattern, max_terms);

        match *pattern {
            TermPattern::Prefix(prefix) => {
                let stream = term_dict
                    .range()
                    .ge(prefix.as_bytes())
                    .into_stream()
                    .map_err(|e| RewriteError::term_dictionary(field, &e))?;
                Self::collect(field, stream, &mut expansion, |term| {
                    if term.starts_with(prefix) {
                        Step::Take
                    } else {
                        Step::Stop
                    }
                })?;
            }
            TermPattern::Wildcard(wildcard) => {
                let literal = literal_prefix(wildcard);
                let stream = term_dict
                    .range()
                    .ge(literal.as_bytes())
                    .into_stream()
                    .map_err(|e| RewriteError::term_dictionary(field, &e))?;
                Self::collect(field, stream, &mut expansion, |term| {
                    if !term.starts_with(literal) {
                        Step::Stop
                    } else if wildcard_matches(wildcard, term) {
                        Step::Take
                    } else {
                        Step::Skip
                    }
                })?;
            }
            TermPattern::Fuzzy { term, distance } => {
                let dfa = LevenshteinDfa(fuzzy_dfa(term, distance)?);
                let stream = term_dict
                    .search(dfa)
                    .into_stream()
                    .map_err(|e| RewriteError::term_dictionary(field, &e))?;
                Self::collect(field, stream, &mut expansion, |_| Step::Take)?;
            }
        }
        Ok(expansion.finish())
    }
}

/// A [`DocumentSource`] reading a Tantivy index.
pub struct TantivyStore {
    /// Searcher pinned to the segments present at open time.
    searcher: Searcher,
    /// Index schema.
    schema: Schema,
    /// The `_uid` field.
    uid_field: Field,
    /// The `_source` field, if the schema has one.
    source_field: Option<Field>,
    /// Term dictionaries by segment ordinal.
    dictionaries: Vec<SegmentDictionary>,
}

impl TantivyStore {
    /// Opens an index and pins a searcher over its current segments.
    ///
    /// Registers `analyzer` as the index's glint tokenizer.
    pub fn open(index: &Index, analyzer: TextAnalyzer) -> Result<Self, SourceError> {
        index.tokenizers().register(GLINT_TOKENIZER, analyzer);

        let schema = index.schema();
        let uid_field = schema
            .get_field(UID_FIELD)
            .map_err(|_| SourceError::UnknownField(UID_FIELD.to_string()))?;
        let source_field = schema.get_field(SOURCE_FIELD).ok();

        let reader = index.reader().map_err(|e| SourceError::open(&e))?;
        let searcher = reader.searcher();
        let dictionaries = searcher
            .segment_readers()
            .iter()
            .map(|segment| SegmentDictionary {
                reader: segment.clone(),
                schema: schema.clone(),
            })
            .collect();

        debug!(
            segments = searcher.segment_readers().len(),
            docs = searcher.num_docs(),
            "opened index"
        );
        Ok(Self {
            searcher,
            schema,
            uid_field,
            source_field,
            dictionaries,
        })
    }

    /// Opens the index stored in a directory.
    pub fn open_dir(path: &Path, analyzer: TextAnalyzer) -> Result<Self, SourceError> {
        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            SourceError::open(&err)
        })?;
        let index = Index::open(dir).map_err(|e| SourceError::open(&e))?;
        Self::open(&index, analyzer)
    }

    /// Loads a stored document.
    fn document(&self, doc: DocAddress) -> Result<TantivyDocument, SourceError> {
        let in_range = self
            .searcher
            .segment_readers()
            .get(doc.segment as usize)
            .is_some_and(|segment| doc.doc_id < segment.max_doc());
        if !in_range {
            return Err(SourceError::MissingDocument(doc));
        }
        self.searcher
            .doc(tantivy::DocAddress::new(doc.segment, doc.doc_id))
            .map_err(|e| SourceError::read(&e))
    }
}

impl DocumentSource for TantivyStore {
    fn stored_values(&self, doc: DocAddress, field: &str) -> Result<Vec<String>, SourceError> {
        let handle = self
            .schema
            .get_field(field)
            .map_err(|_| SourceError::UnknownField(field.to_string()))?;
        let document = self.document(doc)?;
        Ok(document
            .get_all(handle)
            .filter_map(|v| v.as_str())
            .map(ToString::to_string)
            .collect())
    }

    fn source(&self, doc: DocAddress) -> Result<Option<Value>, SourceError> {
        let Some(field) = self.source_field else {
            return Ok(None);
        };
        let document = self.document(doc)?;
        match document.get_first(field).and_then(|v| v.as_str()) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn term_vector(
        &self,
        _doc: DocAddress,
        _field: &str,
    ) -> Result<Option<TermVector>, SourceError> {
        Ok(None)
    }

    fn uid(&self, doc: DocAddress) -> Result<Uid, SourceError> {
        let document = self.document(doc)?;
        document
            .get_first(self.uid_field)
            .and_then(|v| v.as_str())
            .ok_or(SourceError::MissingUid(doc))?
            .parse()
    }

    fn rewriter(&self, segment: SegmentOrd) -> Option<&dyn TermRewriter> {
        self.dictionaries
            .get(segment as usize)
            .map(|d| d as &dyn TermRewriter)
    }
}
