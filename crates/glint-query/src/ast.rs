//! Query tree model.
//!
//! Represents an already parsed query as handed to the fetch phase. The tree is
//! closed: every node kind the highlighter knows about is a variant here, and
//! anything else arrives as [`QueryNode::Opaque`]. Trees (de)serialize as JSON objects
//! tagged by `type`, which is how fixtures and requests describe them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    children::{ChildHit, ChildHitIndex, DocAddress},
    term::{HighlightTerm, PhraseTerm},
};

/// A node of a parsed query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryNode {
    /// Exact term.
    Term(HighlightTerm),

    /// Exact term sequence.
    Phrase(PhraseTerm),

    /// Boolean combination of clauses.
    Boolean {
        /// Clauses with their occurrence.
        clauses: Vec<BooleanClause>,
    },

    /// Constant-score wrapper around a query or a filter.
    ConstantScore {
        /// The wrapped query or filter.
        inner: ConstantScoreInner,
    },

    /// A query restricted by a filter.
    Filtered {
        /// The scoring query.
        query: Box<Self>,
        /// The restricting filter.
        filter: Filter,
    },

    /// Disjunction scored by its best option.
    DisjunctionMax {
        /// The alternatives.
        options: Vec<Self>,
    },

    /// Pattern over a field's terms (prefix, wildcard, fuzzy, phrase prefix).
    MultiTerm(MultiTermQuery),

    /// Score-modifying wrapper; transparent to highlighting.
    FunctionScore {
        /// The wrapped query.
        query: Box<Self>,
    },

    /// Join from parent documents to child documents.
    Relational(RelationalQuery),

    /// A node kind the highlighter does not model.
    Opaque(OpaqueQuery),
}

impl QueryNode {
    /// Creates a term query.
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Term(HighlightTerm::new(field, text))
    }

    /// Creates a phrase query.
    pub fn phrase<S: Into<String>>(
        field: impl Into<String>,
        terms: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Phrase(PhraseTerm::new(field, terms))
    }

    /// Creates a boolean query.
    pub fn boolean(clauses: Vec<BooleanClause>) -> Self {
        Self::Boolean { clauses }
    }

    /// Creates a constant-score query wrapping a filter.
    pub fn constant_score_filter(filter: Filter) -> Self {
        Self::ConstantScore {
            inner: ConstantScoreInner::Filter(filter),
        }
    }

    /// Creates a constant-score query wrapping a query.
    pub fn constant_score_query(query: Self) -> Self {
        Self::ConstantScore {
            inner: ConstantScoreInner::Query(Box::new(query)),
        }
    }

    /// Creates a filtered query.
    pub fn filtered(query: Self, filter: Filter) -> Self {
        Self::Filtered {
            query: Box::new(query),
            filter,
        }
    }

    /// Creates a disjunction-max query.
    pub fn dis_max(options: Vec<Self>) -> Self {
        Self::DisjunctionMax { options }
    }

    /// Creates a prefix query.
    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::MultiTerm(MultiTermQuery::new(
            field,
            MultiTermPattern::Prefix {
                prefix: prefix.into(),
            },
        ))
    }

    /// Creates a wildcard query (`*` and `?`).
    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::MultiTerm(MultiTermQuery::new(
            field,
            MultiTermPattern::Wildcard {
                pattern: pattern.into(),
            },
        ))
    }

    /// Creates a fuzzy query with the given edit distance.
    pub fn fuzzy(field: impl Into<String>, term: impl Into<String>, distance: u8) -> Self {
        Self::MultiTerm(MultiTermQuery::new(
            field,
            MultiTermPattern::Fuzzy {
                term: term.into(),
                distance,
            },
        ))
    }

    /// Creates a function-score wrapper.
    pub fn function_score(query: Self) -> Self {
        Self::FunctionScore {
            query: Box::new(query),
        }
    }

    /// Creates a relational query joining to children of `child_type`.
    pub fn relational(child_type: impl Into<String>, child_query: Self) -> Self {
        Self::Relational(RelationalQuery::new(child_type, child_query))
    }

    /// Creates an opaque node of the given kind.
    pub fn opaque(kind: impl Into<String>) -> Self {
        Self::Opaque(OpaqueQuery {
            kind: kind.into(),
            default_terms: None,
        })
    }

    /// Formats the node as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term(term) => writeln!(f, "{prefix}Term({term})"),
            Self::Phrase(phrase) => writeln!(f, "{prefix}Phrase({phrase})"),
            Self::Boolean { clauses } => {
                writeln!(f, "{prefix}Boolean")?;
                for clause in clauses {
                    writeln!(f, "{prefix}  {:?}", clause.occur)?;
                    clause.query.fmt_tree(f, indent + 2)?;
                }
                Ok(())
            }
            Self::ConstantScore { inner } => {
                writeln!(f, "{prefix}ConstantScore")?;
                match inner {
                    ConstantScoreInner::Query(query) => query.fmt_tree(f, indent + 1),
                    ConstantScoreInner::Filter(filter) => filter.fmt_tree(f, indent + 1),
                }
            }
            Self::Filtered { query, filter } => {
                writeln!(f, "{prefix}Filtered")?;
                query.fmt_tree(f, indent + 1)?;
                filter.fmt_tree(f, indent + 1)
            }
            Self::DisjunctionMax { options } => {
                writeln!(f, "{prefix}DisjunctionMax")?;
                for option in options {
                    option.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::MultiTerm(query) => writeln!(f, "{prefix}MultiTerm({query})"),
            Self::FunctionScore { query } => {
                writeln!(f, "{prefix}FunctionScore")?;
                query.fmt_tree(f, indent + 1)
            }
            Self::Relational(rel) => {
                writeln!(f, "{prefix}Relational({:?})", rel.child_type)?;
                rel.child_query.fmt_tree(f, indent + 1)
            }
            Self::Opaque(opaque) => writeln!(f, "{prefix}Opaque({:?})", opaque.kind),
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// How a boolean clause participates in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause may match.
    Should,
    /// The clause must not match.
    MustNot,
}

/// A clause of a boolean query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanClause {
    /// Occurrence of the clause.
    pub occur: Occur,
    /// The clause's query.
    pub query: QueryNode,
}

impl BooleanClause {
    /// Creates a `Must` clause.
    pub fn must(query: QueryNode) -> Self {
        Self {
            occur: Occur::Must,
            query,
        }
    }

    /// Creates a `Should` clause.
    pub fn should(query: QueryNode) -> Self {
        Self {
            occur: Occur::Should,
            query,
        }
    }

    /// Creates a `MustNot` clause.
    pub fn must_not(query: QueryNode) -> Self {
        Self {
            occur: Occur::MustNot,
            query,
        }
    }

    /// Returns true for `MustNot` clauses.
    pub fn is_prohibited(&self) -> bool {
        self.occur == Occur::MustNot
    }
}

/// What a constant-score node wraps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantScoreInner {
    /// A query.
    Query(Box<QueryNode>),
    /// A filter.
    Filter(Filter),
}

/// A non-scoring predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Exact term.
    Term(HighlightTerm),

    /// Any of several exact terms in one field.
    Terms {
        /// Field the terms belong to.
        field: String,
        /// Accepted term texts.
        values: Vec<String>,
    },

    /// Boolean combination of filters.
    Boolean {
        /// Filters that must match.
        #[serde(default)]
        must: Vec<Self>,
        /// Filters that must not match.
        #[serde(default)]
        must_not: Vec<Self>,
    },

    /// A filter wrapping a multi-term query.
    MultiTerm(MultiTermFilter),

    /// A filter kind the highlighter does not model.
    Opaque {
        /// Engine-specific kind name.
        kind: String,
    },
}

impl Filter {
    /// Creates a term filter.
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Term(HighlightTerm::new(field, text))
    }

    /// Creates a terms filter.
    pub fn terms<S: Into<String>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a boolean filter.
    pub fn boolean(must: Vec<Self>, must_not: Vec<Self>) -> Self {
        Self::Boolean { must, must_not }
    }

    /// Creates a filter wrapping a multi-term query.
    pub fn multi_term(query: MultiTermQuery) -> Self {
        Self::MultiTerm(MultiTermFilter { query })
    }

    /// Formats the filter as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term(term) => writeln!(f, "{prefix}TermFilter({term})"),
            Self::Terms { field, values } => {
                writeln!(f, "{prefix}TermsFilter({field}:{values:?})")
            }
            Self::Boolean { must, must_not } => {
                writeln!(f, "{prefix}BooleanFilter")?;
                for filter in must {
                    filter.fmt_tree(f, indent + 1)?;
                }
                for filter in must_not {
                    writeln!(f, "{prefix}  MustNot")?;
                    filter.fmt_tree(f, indent + 2)?;
                }
                Ok(())
            }
            Self::MultiTerm(filter) => writeln!(f, "{prefix}MultiTermFilter({})", filter.query),
            Self::Opaque { kind } => writeln!(f, "{prefix}OpaqueFilter({kind:?})"),
        }
    }
}

/// A filter wrapping a multi-term query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTermFilter {
    /// The wrapped query.
    query: MultiTermQuery,
}

impl MultiTermFilter {
    /// Returns the wrapped multi-term query.
    pub fn wrapped_query(&self) -> &MultiTermQuery {
        &self.query
    }
}

/// A pattern over the terms of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTermQuery {
    /// Field whose terms are matched.
    pub field: String,
    /// The pattern.
    pub pattern: MultiTermPattern,
}

impl MultiTermQuery {
    /// Creates a multi-term query.
    pub fn new(field: impl Into<String>, pattern: MultiTermPattern) -> Self {
        Self {
            field: field.into(),
            pattern,
        }
    }
}

impl fmt::Display for MultiTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.pattern)
    }
}

/// The shape of a multi-term pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MultiTermPattern {
    /// Terms starting with `prefix`.
    Prefix {
        /// Required prefix.
        prefix: String,
    },
    /// Terms matching a `*`/`?` wildcard pattern.
    Wildcard {
        /// The wildcard pattern.
        pattern: String,
    },
    /// Terms within `distance` edits of `term`.
    Fuzzy {
        /// The reference term.
        term: String,
        /// Maximum Levenshtein distance.
        distance: u8,
    },
    /// Exact leading terms followed by a term starting with `prefix`.
    PhrasePrefix {
        /// Leading exact terms.
        terms: Vec<String>,
        /// Prefix of the final term.
        prefix: String,
    },
}

impl fmt::Display for MultiTermPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix { prefix } => write!(f, "{prefix}*"),
            Self::Wildcard { pattern } => write!(f, "{pattern}"),
            Self::Fuzzy { term, distance } => write!(f, "{term}~{distance}"),
            Self::PhrasePrefix { terms, prefix } => {
                if terms.is_empty() {
                    write!(f, "\"{prefix}*\"")
                } else {
                    write!(f, "\"{} {prefix}*\"", terms.join(" "))
                }
            }
        }
    }
}

/// A join from parent documents to the children that satisfy `child_query`.
///
/// The gather limit and the child-hit index are execution state: they are set on
/// the tree before and during scoring and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalQuery {
    /// Document type of the children.
    pub child_type: String,
    /// Predicate the children must satisfy.
    pub child_query: Box<QueryNode>,
    /// Maximum children gathered per parent; `None` when gathering is off.
    #[serde(skip)]
    gather_limit: Option<usize>,
    /// Children recorded by the executor while scoring.
    #[serde(skip)]
    child_hits: Option<ChildHitIndex>,
}

impl RelationalQuery {
    /// Creates a relational query with gathering disabled.
    pub fn new(child_type: impl Into<String>, child_query: QueryNode) -> Self {
        Self {
            child_type: child_type.into(),
            child_query: Box::new(child_query),
            gather_limit: None,
            child_hits: None,
        }
    }

    /// Asks the executor to gather up to `max` matching children per parent.
    pub fn gather_children(&mut self, max: usize) {
        self.gather_limit = Some(max);
    }

    /// Returns the gather limit, if gathering is enabled.
    pub fn gather_limit(&self) -> Option<usize> {
        self.gather_limit
    }

    /// Installs the child hits the executor collected while scoring.
    ///
    /// Entries are truncated to the gather limit. Without gathering enabled the
    /// index is discarded.
    pub fn record_child_hits(&mut self, mut index: ChildHitIndex) {
        let Some(limit) = self.gather_limit else {
            debug!(
                child_type = %self.child_type,
                "discarding child hits for relational clause without gathering"
            );
            return;
        };
        index.truncate_each(limit);
        self.child_hits = Some(index);
    }

    /// Returns the recorded children of `parent`, empty if there are none.
    pub fn child_hits_for(&self, parent: DocAddress) -> &[ChildHit] {
        self.child_hits
            .as_ref()
            .map(|index| index.get(parent))
            .unwrap_or(&[])
    }

    /// Returns the recorded child-hit index, if any.
    pub fn child_hits(&self) -> Option<&ChildHitIndex> {
        self.child_hits.as_ref()
    }
}

/// A node of a kind the highlighter does not model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaqueQuery {
    /// Engine-specific kind name.
    pub kind: String,
    /// Terms the engine's default single-level extraction yields for this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_terms: Option<Vec<HighlightTerm>>,
}
