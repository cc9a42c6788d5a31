//! Query tree model and query decomposition for glint.
//!
//! The fetch phase receives an already parsed, already scored query tree. This crate
//! models that tree and provides the two walks the fetch phase needs over it:
//!
//! - **Term extraction** ([`extract_terms`]): flattens the tree into the leaf terms and
//!   phrases used to score highlight candidates. Prohibited clauses, relational
//!   sub-clauses and (by default) filters contribute nothing.
//! - **Relation resolution** ([`enable_child_gathering`], [`find_child_hits`]): finds
//!   the relational (join) sub-clauses and recovers, per parent document, the child
//!   documents that satisfied the child predicate while the query was scored.
//!
//! Every piece of per-call state (filter inclusion, the segment's term dictionary)
//! is passed explicitly through [`ExtractContext`], so a single tree can be walked
//! from many worker threads at once.
//!
//! # Example
//!
//! ```
//! use glint_query::{BooleanClause, ExtractContext, Filter, QueryNode, extract_terms};
//!
//! let query = QueryNode::boolean(vec![
//!     BooleanClause::must(QueryNode::term("title", "rust")),
//!     BooleanClause::must_not(QueryNode::term("title", "golang")),
//!     BooleanClause::should(QueryNode::constant_score_filter(Filter::term("tag", "lang"))),
//! ]);
//!
//! let extracted = extract_terms(&query, &ExtractContext::default());
//! assert!(extracted.contains_term("title", "rust"));
//! assert!(!extracted.contains_term("title", "golang"));
//! assert!(!extracted.contains_term("tag", "lang"));
//! ```

#![warn(missing_docs)]

mod ast;
mod children;
mod error;
mod extract;
mod relation;
mod term;

pub use ast::{
    BooleanClause, ConstantScoreInner, Filter, MultiTermFilter, MultiTermPattern, MultiTermQuery,
    Occur, OpaqueQuery, QueryNode, RelationalQuery,
};
pub use children::{ChildHit, ChildHitIndex, DocAddress, DocId, SegmentOrd};
pub use error::RewriteError;
pub use extract::{
    DEFAULT_MAX_CLAUSE_COUNT, ExtractContext, ExtractedTerms, TermPattern, TermRewriter,
    extract_terms,
};
pub use relation::{
    child_queries, children_query, enable_child_gathering, find_child_hits, record_child_hits,
    relational_clauses,
};
pub use term::{HighlightTerm, PhraseTerm};
