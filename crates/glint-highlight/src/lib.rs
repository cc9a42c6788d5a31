//! Fragment selection, offset aggregation and tag formatting.
//!
//! Given the values of a field and the query terms that apply to it, this crate finds
//! the best excerpts and renders them, either as tagged text or as offsets into the
//! field's values laid end to end.
//!
//! # Example
//!
//! ```
//! use glint_config::HighlightOptions;
//! use glint_highlight::{AggregatedHighlight, FieldHighlighter, FieldTerms, build_analyzer_from_name};
//! use glint_query::{ExtractContext, QueryNode, extract_terms};
//!
//! let extracted = extract_terms(&QueryNode::term("body", "tag1"), &ExtractContext::default());
//! let terms = FieldTerms::for_field(&extracted, "body", true);
//! let analyzer = build_analyzer_from_name("english").unwrap();
//! let options = HighlightOptions::default();
//!
//! let highlighter = FieldHighlighter::new(&analyzer, &options, &terms);
//! let result = highlighter.highlight(&["foo bar tag1 stuff"], None);
//! assert_eq!(
//!     result,
//!     Some(AggregatedHighlight::Fragments(vec!["foo bar <em>tag1</em> stuff".into()]))
//! );
//! ```

#![warn(missing_docs)]

mod aggregate;
mod analyzer;
mod error;
mod field;
mod format;
mod fragment;
mod ranges;
pub mod select;
mod terms;
mod vector;

pub use aggregate::{AggregatedHighlight, HighlightOffsets, ValueFragments, aggregate};
pub use analyzer::{GLINT_TOKENIZER, build_analyzer, build_analyzer_from_name, parse_language};
pub use error::HighlightError;
pub use field::FieldHighlighter;
pub use format::highlight_fragment;
pub use fragment::{FragmentCandidate, MatchSpan, WeightedSpan};
pub use ranges::merge_spans;
pub use terms::FieldTerms;
pub use vector::{TermOccurrence, TermVector, tokenize};
