//! Extraction of highlight terms from a query tree.
//!
//! The walk keeps the terms a document can be highlighted for: positive clauses of
//! boolean queries, every option of a disjunction, the query side of wrappers and,
//! only on request, the filter side. Multi-term patterns are rewritten against the
//! segment's term dictionary before they are flattened. Nothing here fails: a node
//! that cannot be turned into terms contributes none.

use std::{collections::HashSet, fmt};

use tracing::{debug, trace};

use crate::{
    ast::{
        BooleanClause, ConstantScoreInner, Filter, MultiTermPattern, MultiTermQuery, QueryNode,
    },
    error::RewriteError,
    term::{HighlightTerm, PhraseTerm},
};

/// Default ceiling on the number of terms a multi-term pattern may expand to.
pub const DEFAULT_MAX_CLAUSE_COUNT: usize = 1024;

/// A single-term pattern handed to a [`TermRewriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermPattern<'a> {
    /// Terms starting with the prefix.
    Prefix(&'a str),
    /// Terms matching a `*`/`?` wildcard pattern.
    Wildcard(&'a str),
    /// Terms within `distance` edits of `term`.
    Fuzzy {
        /// Reference term.
        term: &'a str,
        /// Maximum Levenshtein distance.
        distance: u8,
    },
}

impl fmt::Display for TermPattern<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Wildcard(pattern) => write!(f, "{pattern}"),
            Self::Fuzzy { term, distance } => write!(f, "{term}~{distance}"),
        }
    }
}

/// Expands term patterns into the exact terms present in an index segment.
pub trait TermRewriter: Sync {
    /// Returns the terms of `field` matching `pattern`, in dictionary order.
    ///
    /// Implementations return [`RewriteError::TooManyClauses`] as soon as more than
    /// `max_terms` terms match.
    fn expand(
        &self,
        field: &str,
        pattern: &TermPattern<'_>,
        max_terms: usize,
    ) -> Result<Vec<String>, RewriteError>;
}

/// Per-call settings for [`extract_terms`].
#[derive(Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Whether filters contribute terms.
    pub include_filters: bool,
    /// Term dictionary used to rewrite multi-term patterns.
    pub rewriter: Option<&'a dyn TermRewriter>,
    /// Ceiling on the expansion of a single multi-term pattern.
    pub max_clause_count: usize,
}

impl<'a> ExtractContext<'a> {
    /// Creates a context with filters excluded and no rewriter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether filters contribute terms.
    pub fn with_filters(mut self, include_filters: bool) -> Self {
        self.include_filters = include_filters;
        self
    }

    /// Sets the term dictionary used for multi-term rewriting.
    pub fn with_rewriter(mut self, rewriter: &'a dyn TermRewriter) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    /// Sets the multi-term expansion ceiling.
    pub fn with_max_clause_count(mut self, max_clause_count: usize) -> Self {
        self.max_clause_count = max_clause_count;
        self
    }
}

impl Default for ExtractContext<'_> {
    fn default() -> Self {
        Self {
            include_filters: false,
            rewriter: None,
            max_clause_count: DEFAULT_MAX_CLAUSE_COUNT,
        }
    }
}

impl fmt::Debug for ExtractContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractContext")
            .field("include_filters", &self.include_filters)
            .field("rewriter", &self.rewriter.is_some())
            .field("max_clause_count", &self.max_clause_count)
            .finish()
    }
}

/// The de-duplicated terms and phrases extracted from a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTerms {
    /// Exact terms.
    pub terms: HashSet<HighlightTerm>,
    /// Exact term sequences of two or more terms.
    pub phrases: HashSet<PhraseTerm>,
}

impl ExtractedTerms {
    /// Adds a term. The first occurrence of a term keeps its weight.
    pub fn insert_term(&mut self, term: HighlightTerm) {
        self.terms.insert(term);
    }

    /// Adds a phrase. Single-term phrases are stored as terms; empty ones are dropped.
    pub fn insert_phrase(&mut self, phrase: PhraseTerm) {
        if phrase.terms.is_empty() {
            return;
        }
        match phrase.as_single_term() {
            Some(term) => self.insert_term(term),
            None => {
                self.phrases.insert(phrase);
            }
        }
    }

    /// Returns true if the exact term was extracted.
    pub fn contains_term(&self, field: &str, text: &str) -> bool {
        self.terms.contains(&HighlightTerm::new(field, text))
    }

    /// Returns true if the exact phrase was extracted.
    pub fn contains_phrase(&self, field: &str, terms: &[&str]) -> bool {
        self.phrases
            .contains(&PhraseTerm::new(field, terms.iter().copied()))
    }

    /// Returns only the terms and phrases of one field.
    pub fn for_field(&self, field: &str) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .filter(|t| t.field == field)
                .cloned()
                .collect(),
            phrases: self
                .phrases
                .iter()
                .filter(|p| p.field == field)
                .cloned()
                .collect(),
        }
    }

    /// Total number of terms and phrases.
    pub fn len(&self) -> usize {
        self.terms.len() + self.phrases.len()
    }

    /// Returns true if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }
}

/// Extracts the highlight terms of a query tree.
pub fn extract_terms(query: &QueryNode, ctx: &ExtractContext<'_>) -> ExtractedTerms {
    let mut out = ExtractedTerms::default();
    flatten(query, ctx, &mut out);
    out
}

/// Recursive step of [`extract_terms`].
fn flatten(node: &QueryNode, ctx: &ExtractContext<'_>, out: &mut ExtractedTerms) {
    match node {
        QueryNode::Term(term) => out.insert_term(term.clone()),
        QueryNode::Phrase(phrase) => out.insert_phrase(phrase.clone()),
        QueryNode::Boolean { clauses } => {
            for clause in clauses.iter().filter(|c| !c.is_prohibited()) {
                flatten(&clause.query, ctx, out);
            }
        }
        QueryNode::ConstantScore { inner } => match inner {
            ConstantScoreInner::Query(query) => flatten(query, ctx, out),
            ConstantScoreInner::Filter(filter) => {
                if ctx.include_filters {
                    flatten_filter(filter, ctx, out);
                }
            }
        },
        QueryNode::Filtered { query, filter } => {
            flatten(query, ctx, out);
            if ctx.include_filters {
                flatten_filter(filter, ctx, out);
            }
        }
        QueryNode::DisjunctionMax { options } => {
            for option in options {
                flatten(option, ctx, out);
            }
        }
        QueryNode::FunctionScore { query } => flatten(query, ctx, out),
        QueryNode::MultiTerm(query) => {
            if let Some(rewritten) = rewrite(query, ctx) {
                flatten(&rewritten, ctx, out);
            }
        }
        QueryNode::Relational(rel) => {
            trace!(child_type = %rel.child_type, "relational clause contributes no parent terms");
        }
        QueryNode::Opaque(opaque) => match &opaque.default_terms {
            Some(terms) => {
                for term in terms {
                    out.insert_term(term.clone());
                }
            }
            None => debug!(kind = %opaque.kind, "no term extraction for query kind"),
        },
    }
}

/// Recursive step over filters.
fn flatten_filter(filter: &Filter, ctx: &ExtractContext<'_>, out: &mut ExtractedTerms) {
    match filter {
        Filter::Term(term) => out.insert_term(term.clone()),
        Filter::Terms { field, values } => {
            for value in values {
                out.insert_term(HighlightTerm::new(field, value));
            }
        }
        Filter::Boolean { must, .. } => {
            for filter in must {
                flatten_filter(filter, ctx, out);
            }
        }
        Filter::MultiTerm(filter) => {
            if let Some(rewritten) = rewrite(filter.wrapped_query(), ctx) {
                flatten(&rewritten, ctx, out);
            }
        }
        Filter::Opaque { kind } => debug!(%kind, "no term extraction for filter kind"),
    }
}

/// Rewrites a multi-term query into a disjunction of exact terms or phrases.
///
/// Returns `None` when the query cannot be rewritten; the reason is logged.
fn rewrite(query: &MultiTermQuery, ctx: &ExtractContext<'_>) -> Option<QueryNode> {
    let Some(rewriter) = ctx.rewriter else {
        debug!(query = %query, "no term dictionary available, skipping multi-term query");
        return None;
    };

    let field = query.field.as_str();
    let limit = ctx.max_clause_count;
    let expanded = match &query.pattern {
        MultiTermPattern::Prefix { prefix } => {
            rewriter.expand(field, &TermPattern::Prefix(prefix), limit)
        }
        MultiTermPattern::Wildcard { pattern } => {
            rewriter.expand(field, &TermPattern::Wildcard(pattern), limit)
        }
        MultiTermPattern::Fuzzy { term, distance } => rewriter.expand(
            field,
            &TermPattern::Fuzzy {
                term,
                distance: *distance,
            },
            limit,
        ),
        MultiTermPattern::PhrasePrefix { prefix, .. } => {
            rewriter.expand(field, &TermPattern::Prefix(prefix), limit)
        }
    };

    let expanded = match expanded {
        Ok(terms) if terms.len() > limit => {
            Err(RewriteError::too_many_clauses(field, &query.pattern, limit))
        }
        other => other,
    };

    match expanded {
        Ok(terms) => {
            trace!(query = %query, count = terms.len(), "rewrote multi-term query");
            let clauses = terms
                .into_iter()
                .map(|text| BooleanClause::should(expansion_node(query, text)))
                .collect();
            Some(QueryNode::boolean(clauses))
        }
        Err(e) => {
            debug!(query = %query, error = %e, "multi-term query contributes no terms");
            None
        }
    }
}

/// Builds the exact node for one expansion of a multi-term query.
fn expansion_node(query: &MultiTermQuery, text: String) -> QueryNode {
    match &query.pattern {
        MultiTermPattern::PhrasePrefix { terms, .. } if !terms.is_empty() => {
            let mut sequence = terms.clone();
            sequence.push(text);
            QueryNode::phrase(query.field.clone(), sequence)
        }
        _ => QueryNode::term(query.field.clone(), text),
    }
}
