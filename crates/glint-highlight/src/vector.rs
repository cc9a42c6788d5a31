//! Term occurrences with positions and offsets.
//!
//! A [`TermVector`] is what an index stores for a field mapped with positions and
//! offsets: every indexed term of every value, where it sits in the token stream and
//! which bytes it covers. The analyzer-based strategy builds the same occurrences on
//! the fly with [`tokenize`].

use serde::{Deserialize, Serialize};
use tantivy::tokenizer::{TextAnalyzer, TokenStream};

/// One indexed token of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermOccurrence {
    /// Indexed term text.
    pub term: String,
    /// Index of the value within the field.
    pub value: usize,
    /// Token position within the value.
    pub position: usize,
    /// Byte offset where the token starts in the value.
    pub start: usize,
    /// Byte offset where the token ends in the value.
    pub end: usize,
}

/// Every token occurrence of a field, across all of its values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermVector {
    /// Occurrences, grouped by value and sorted by position.
    pub occurrences: Vec<TermOccurrence>,
}

impl TermVector {
    /// Builds the term vector of a field by analyzing each of its values.
    pub fn from_values<S: AsRef<str>>(analyzer: &TextAnalyzer, values: &[S]) -> Self {
        let occurrences = values
            .iter()
            .enumerate()
            .flat_map(|(value, text)| tokenize(analyzer, value, text.as_ref()))
            .collect();
        Self { occurrences }
    }

    /// Returns the occurrences of one value.
    pub fn for_value(&self, value: usize) -> Vec<TermOccurrence> {
        self.occurrences
            .iter()
            .filter(|o| o.value == value)
            .cloned()
            .collect()
    }
}

/// Tokenizes one value into term occurrences.
pub fn tokenize(analyzer: &TextAnalyzer, value: usize, text: &str) -> Vec<TermOccurrence> {
    let mut analyzer = analyzer.clone();
    let mut stream = analyzer.token_stream(text);
    let mut occurrences = Vec::new();

    while let Some(token) = stream.next() {
        occurrences.push(TermOccurrence {
            term: token.text.clone(),
            value,
            position: token.position,
            start: token.offset_from,
            end: token.offset_to,
        });
    }

    occurrences
}
