//! Leaf predicates produced by term extraction.
//!
//! Identity of a term is its field plus its text (or text sequence for phrases). The
//! boost is carried along as the highlight weight but takes no part in equality, so
//! the same term reached through two different clauses is kept once.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

/// Default highlight weight of a term.
fn default_boost() -> f32 {
    1.0
}

/// An exact term in a field, as it appears in the index (already analyzed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightTerm {
    /// Field the term belongs to.
    pub field: String,
    /// Indexed term text.
    pub text: String,
    /// Weight added to a fragment's score for every occurrence.
    #[serde(default = "default_boost")]
    pub boost: f32,
}

impl HighlightTerm {
    /// Creates a term with the default weight.
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            text: text.into(),
            boost: default_boost(),
        }
    }

    /// Returns the same term with a different weight.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl PartialEq for HighlightTerm {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.text == other.text
    }
}

impl Eq for HighlightTerm {}

impl Hash for HighlightTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.text.hash(state);
    }
}

impl fmt::Display for HighlightTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

/// An exact sequence of terms in a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseTerm {
    /// Field the phrase belongs to.
    pub field: String,
    /// Indexed terms, in order.
    pub terms: Vec<String>,
    /// Weight added per phrase term for every occurrence of the whole phrase.
    #[serde(default = "default_boost")]
    pub boost: f32,
}

impl PhraseTerm {
    /// Creates a phrase with the default weight.
    pub fn new<S: Into<String>>(field: impl Into<String>, terms: impl IntoIterator<Item = S>) -> Self {
        Self {
            field: field.into(),
            terms: terms.into_iter().map(Into::into).collect(),
            boost: default_boost(),
        }
    }

    /// Returns the single term of a one-word phrase.
    pub fn as_single_term(&self) -> Option<HighlightTerm> {
        match self.terms.as_slice() {
            [only] => Some(HighlightTerm::new(&self.field, only).with_boost(self.boost)),
            _ => None,
        }
    }
}

impl PartialEq for PhraseTerm {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.terms == other.terms
    }
}

impl Eq for PhraseTerm {}

impl Hash for PhraseTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.terms.hash(state);
    }
}

impl fmt::Display for PhraseTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:\"{}\"", self.field, self.terms.join(" "))
    }
}
