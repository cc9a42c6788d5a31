//! Error types for multi-term rewriting.

use std::error;

use thiserror::Error;

/// Errors raised while expanding a multi-term pattern against a term dictionary.
///
/// None of these abort term extraction: the offending node simply contributes no
/// highlight terms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The expansion produced more terms than the clause ceiling allows.
    #[error("too many clauses expanding {pattern} on field {field} (limit {limit})")]
    TooManyClauses {
        /// Field being expanded.
        field: String,
        /// Pattern being expanded.
        pattern: String,
        /// The clause ceiling that was exceeded.
        limit: usize,
    },

    /// The pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    /// The term dictionary could not be read.
    #[error("failed to read term dictionary for field {field}: {message}")]
    TermDictionary {
        /// Field whose dictionary failed.
        field: String,
        /// Underlying error message.
        message: String,
    },
}

impl RewriteError {
    /// Creates a `TooManyClauses` error.
    pub fn too_many_clauses(field: &str, pattern: impl ToString, limit: usize) -> Self {
        Self::TooManyClauses {
            field: field.to_string(),
            pattern: pattern.to_string(),
            limit,
        }
    }

    /// Creates a `TermDictionary` error from any displayable source.
    pub fn term_dictionary(field: &str, source: &dyn error::Error) -> Self {
        Self::TermDictionary {
            field: field.to_string(),
            message: source.to_string(),
        }
    }
}
