//! Highlighting of one field of one document.

use glint_config::HighlightOptions;
use tantivy::tokenizer::TextAnalyzer;
use tracing::trace;

use crate::{
    AggregatedHighlight, FieldTerms,
    aggregate::{ValueFragments, aggregate},
    fragment::FragmentCandidate,
    select::{
        analyzed,
        positions::{self, FragListKind},
    },
    vector::{TermVector, tokenize},
};

/// Highlights the values of a field with a fixed set of terms and options.
///
/// The strategy is chosen per call: a term vector, when the store has one for the
/// field, drives position-based selection; otherwise every value is re-analyzed.
#[derive(Clone, Copy)]
pub struct FieldHighlighter<'a> {
    /// Analyzer used when no term vector is available.
    analyzer: &'a TextAnalyzer,
    /// Options of the field.
    options: &'a HighlightOptions,
    /// Terms that apply to the field.
    terms: &'a FieldTerms,
}

impl<'a> FieldHighlighter<'a> {
    /// Creates a highlighter for one field.
    pub fn new(
        analyzer: &'a TextAnalyzer,
        options: &'a HighlightOptions,
        terms: &'a FieldTerms,
    ) -> Self {
        Self {
            analyzer,
            options,
            terms,
        }
    }

    /// Highlights the values of the field.
    ///
    /// Returns `None` when nothing in the values matched.
    pub fn highlight<S: AsRef<str>>(
        &self,
        values: &[S],
        term_vector: Option<&TermVector>,
    ) -> Option<AggregatedHighlight> {
        if self.terms.is_empty() || values.is_empty() {
            return None;
        }

        trace!(
            values = values.len(),
            term_vector = term_vector.is_some(),
            "highlighting field"
        );
        let per_value: Vec<ValueFragments<'_>> = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let text = value.as_ref();
                let candidates = match term_vector {
                    Some(vector) => self.select_by_positions(text, vector, index),
                    None => self.select_by_analysis(text, index),
                };
                ValueFragments { text, candidates }
            })
            .collect();

        let result = aggregate(&per_value, self.options);
        (!result.is_empty()).then_some(result)
    }

    /// Selects candidates of one value from its stored term occurrences.
    fn select_by_positions(
        &self,
        text: &str,
        vector: &TermVector,
        index: usize,
    ) -> Vec<FragmentCandidate> {
        let spans = self.terms.find_spans(text, &vector.for_value(index));
        positions::select(
            FragListKind::for_options(self.options),
            text,
            &spans,
            self.options.fragment_size,
            self.options.number_of_fragments,
        )
    }

    /// Selects candidates of one value by re-analyzing it.
    fn select_by_analysis(&self, text: &str, index: usize) -> Vec<FragmentCandidate> {
        let tokens = tokenize(self.analyzer, index, text);
        let spans = self.terms.find_spans(text, &tokens);
        // One candidate per match in offsets-only mode.
        let fragment_size = if self.options.offsets_only {
            0
        } else {
            self.options.fragment_size
        };
        analyzed::select(
            text,
            &spans,
            &tokens,
            fragment_size,
            self.options.number_of_fragments,
        )
    }
}
