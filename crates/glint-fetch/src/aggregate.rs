//! Assembly of the highlight and children results of one hit.

use std::collections::BTreeMap;

use glint_config::{ChildrenSettings, Config, FieldHighlightConfig};
use glint_highlight::{AggregatedHighlight, FieldHighlighter, FieldTerms, HighlightOffsets};
use glint_query::{
    ChildHit, ExtractContext, ExtractedTerms, QueryNode, SegmentOrd, children_query,
    extract_terms, find_child_hits,
};
use serde_json::Value;
use tantivy::tokenizer::TextAnalyzer;
use tracing::{debug, trace};

use crate::{
    ChildrenResult, DocRef, DocumentMappings, DocumentSource, FetchError, FieldMapping,
    HighlightField, HitHighlights, MappingLookup, SourceError, source_values,
};

/// Everything a hit is aggregated against.
///
/// Shared by every worker of a page; nothing in it changes during a fetch.
#[derive(Clone, Copy)]
pub struct HitContext<'a> {
    /// Store the hits are read from.
    pub source: &'a dyn DocumentSource,
    /// Field mappings per document type.
    pub mappings: &'a DocumentMappings,
    /// The scored query, with child hits recorded.
    pub query: &'a QueryNode,
    /// Analyzer used to re-tokenize stored values.
    pub analyzer: &'a TextAnalyzer,
    /// Ceiling on multi-term expansion.
    pub max_clause_count: usize,
}

/// Highlighted output of one document.
#[derive(Debug, Default)]
struct DocumentHighlights {
    /// Fields highlighted as fragments.
    fields: BTreeMap<String, HighlightField>,
    /// Fields highlighted as offsets.
    offsets: BTreeMap<String, Vec<HighlightOffsets>>,
}

/// Terms extracted from a query for one segment, with and without filters.
struct TermCache<'a> {
    /// Query the terms come from.
    query: &'a QueryNode,
    /// Base extraction settings.
    ctx: ExtractContext<'a>,
    /// Extractions, indexed by whether filters were included.
    extracted: [Option<ExtractedTerms>; 2],
}

impl<'a> TermCache<'a> {
    /// Prepares extraction of `query` against one segment of `hit`.
    fn new(query: &'a QueryNode, hit: &HitContext<'a>, segment: SegmentOrd) -> Self {
        let mut ctx = ExtractContext::new().with_max_clause_count(hit.max_clause_count);
        if let Some(rewriter) = hit.source.rewriter(segment) {
            ctx = ctx.with_rewriter(rewriter);
        }
        Self {
            query,
            ctx,
            extracted: [None, None],
        }
    }

    /// Returns the extracted terms, with filter terms when `include_filters`.
    fn get(&mut self, include_filters: bool) -> &ExtractedTerms {
        let (query, ctx) = (self.query, self.ctx.with_filters(include_filters));
        self.extracted[usize::from(include_filters)]
            .get_or_insert_with(|| extract_terms(query, &ctx))
    }
}

/// Builds the fetch result of a hit: highlighted fields and children.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    /// Fields highlighted on every hit.
    fields: Vec<FieldHighlightConfig>,
    /// Children settings, when children were requested.
    children: Option<ChildrenSettings>,
}

impl ResultAggregator {
    /// Creates an aggregator for the highlight and children settings of `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            fields: config.highlight.field_configs(),
            children: config.children.clone(),
        }
    }

    /// Aggregates the highlights and children of one hit.
    ///
    /// Fields the hit's type does not map are skipped. A field whose values cannot be
    /// read, or a child document that cannot be loaded, fails the hit.
    pub fn aggregate_hit(
        &self,
        hit: &DocRef,
        ctx: &HitContext<'_>,
    ) -> Result<HitHighlights, FetchError> {
        let mut result = HitHighlights::new(&hit.uid.doc_type, &hit.uid.id);

        if !self.fields.is_empty() {
            let mut terms = TermCache::new(ctx.query, ctx, hit.address.segment);
            let highlights = highlight_document(hit, &self.fields, &mut terms, ctx)?;
            result.fields = highlights.fields;
            for (field, offsets) in highlights.offsets {
                result.insert_offsets(&field, offsets);
            }
        }

        if let Some(children) = &self.children {
            result.children = Some(aggregate_children(hit, children, ctx)?);
        }

        trace!(
            hit = %hit,
            fields = result.fields.len(),
            children = result.children.as_ref().map_or(0, Vec::len),
            "aggregated hit"
        );
        Ok(result)
    }
}

/// Loads and highlights the children recorded for a hit, up to the configured size.
fn aggregate_children(
    hit: &DocRef,
    settings: &ChildrenSettings,
    ctx: &HitContext<'_>,
) -> Result<Vec<ChildrenResult>, FetchError> {
    let hits: Vec<ChildHit> = find_child_hits(ctx.query, hit.address)
        .into_iter()
        .take(settings.size)
        .collect();
    if hits.is_empty() {
        return Ok(Vec::new());
    }

    let fields = settings.highlight.field_configs();
    let query = children_query(ctx.query);
    let mut results = Vec::with_capacity(hits.len());
    for child in hits {
        let address = child.address();
        let uid = ctx
            .source
            .uid(address)
            .map_err(|e| FetchError::child_document(address, e))?;
        let doc = DocRef::new(address, uid);

        let highlight_fields = match &query {
            Some(query) if !fields.is_empty() => {
                let mut terms = TermCache::new(query, ctx, address.segment);
                let highlights = highlight_document(&doc, &fields, &mut terms, ctx)?;
                if !highlights.offsets.is_empty() {
                    debug!(child = %doc, "offsets are not returned for children");
                }
                highlights.fields
            }
            _ => BTreeMap::new(),
        };

        results.push(ChildrenResult {
            doc_type: doc.uid.doc_type,
            id: doc.uid.id,
            highlight_fields,
        });
    }
    Ok(results)
}

/// Highlights the configured fields of one document.
fn highlight_document(
    doc: &DocRef,
    fields: &[FieldHighlightConfig],
    terms: &mut TermCache<'_>,
    ctx: &HitContext<'_>,
) -> Result<DocumentHighlights, FetchError> {
    let mut out = DocumentHighlights::default();
    let mut source: Option<Option<Value>> = None;

    for config in fields {
        let field = config.field.as_str();
        let mapping = match ctx.mappings.lookup(&doc.uid.doc_type, field) {
            MappingLookup::Found(mapping) => mapping,
            MappingLookup::OtherType => {
                trace!(field, doc = %doc, "field is mapped by another type, skipping");
                continue;
            }
            MappingLookup::Missing => {
                trace!(field, doc = %doc, "field is not mapped, skipping");
                continue;
            }
        };

        let options = &config.options;
        let field_terms = FieldTerms::for_field(
            terms.get(options.highlight_filter),
            field,
            options.require_field_match,
        );
        if field_terms.is_empty() {
            continue;
        }

        let values = field_values(doc, field, mapping, &mut source, ctx)
            .map_err(|e| FetchError::highlight(field, doc, e))?;
        let vector = if mapping.term_vectors {
            ctx.source
                .term_vector(doc.address, field)
                .map_err(|e| FetchError::highlight(field, doc, e))?
        } else {
            None
        };

        let highlighter = FieldHighlighter::new(ctx.analyzer, options, &field_terms);
        match highlighter.highlight(&values, vector.as_ref()) {
            Some(AggregatedHighlight::Fragments(fragments)) => {
                out.fields
                    .insert(field.to_string(), HighlightField::new(field, fragments));
            }
            Some(AggregatedHighlight::Offsets(offsets)) => {
                out.offsets.insert(field.to_string(), offsets);
            }
            None => {}
        }
    }
    Ok(out)
}

/// Reads the values of a field: the stored values, or the values at the field's
/// path in `_source`. The `_source` document is loaded once per document.
fn field_values(
    doc: &DocRef,
    field: &str,
    mapping: &FieldMapping,
    source: &mut Option<Option<Value>>,
    ctx: &HitContext<'_>,
) -> Result<Vec<String>, SourceError> {
    if mapping.stored {
        return ctx.source.stored_values(doc.address, field);
    }
    if source.is_none() {
        *source = Some(ctx.source.source(doc.address)?);
    }
    Ok(source
        .as_ref()
        .and_then(Option::as_ref)
        .map(|document| source_values(document, field))
        .unwrap_or_default())
}
