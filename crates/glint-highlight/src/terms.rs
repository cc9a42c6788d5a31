//! Query terms compiled for one field.
//!
//! Extracted terms carry the field they were queried on. With field matching
//! required only the highlighted field's own terms apply; otherwise a term's text
//! is highlighted in any field. Every distinct term or phrase gets a slot number,
//! in a stable order, which later selects its pair of tags.

use std::collections::HashMap;

use glint_query::{ExtractedTerms, HighlightTerm, PhraseTerm};
use tracing::trace;

use crate::{
    fragment::{MatchSpan, WeightedSpan},
    ranges::is_valid_range,
    vector::TermOccurrence,
};

/// Weight and slot of a single term.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TermWeight {
    /// Score added per occurrence.
    boost: f32,
    /// Tag slot.
    slot: usize,
}

/// A phrase to match by consecutive positions.
#[derive(Debug, Clone, PartialEq)]
struct PhraseWeight {
    /// Terms in order.
    terms: Vec<String>,
    /// Score added per matched term.
    boost: f32,
    /// Tag slot.
    slot: usize,
}

/// The terms and phrases that apply to one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTerms {
    /// Single terms by text.
    terms: HashMap<String, TermWeight>,
    /// Phrases of two or more terms.
    phrases: Vec<PhraseWeight>,
}

impl FieldTerms {
    /// Selects the extracted terms that apply to `field`.
    pub fn for_field(extracted: &ExtractedTerms, field: &str, require_field_match: bool) -> Self {
        let applies = |term_field: &str| !require_field_match || term_field == field;

        let mut terms: Vec<&HighlightTerm> =
            extracted.terms.iter().filter(|t| applies(&t.field)).collect();
        terms.sort_by(|a, b| (&a.field, &a.text).cmp(&(&b.field, &b.text)));

        let mut phrases: Vec<&PhraseTerm> = extracted
            .phrases
            .iter()
            .filter(|p| applies(&p.field))
            .collect();
        phrases.sort_by(|a, b| (&a.field, &a.terms).cmp(&(&b.field, &b.terms)));

        let mut out = Self::default();
        for term in terms {
            let slot = out.slots();
            out.terms.entry(term.text.clone()).or_insert(TermWeight {
                boost: term.boost,
                slot,
            });
        }
        for phrase in phrases {
            if out.phrases.iter().any(|p| p.terms == phrase.terms) {
                continue;
            }
            let slot = out.slots();
            out.phrases.push(PhraseWeight {
                terms: phrase.terms.clone(),
                boost: phrase.boost,
                slot,
            });
        }
        out
    }

    /// Number of distinct terms and phrases.
    pub fn slots(&self) -> usize {
        self.terms.len() + self.phrases.len()
    }

    /// Returns true if nothing can match.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }

    /// Finds every term and phrase occurrence in one value, sorted by range.
    ///
    /// Occurrences whose offsets do not address `text` are ignored.
    pub fn find_spans(&self, text: &str, occurrences: &[TermOccurrence]) -> Vec<WeightedSpan> {
        let valid: Vec<&TermOccurrence> = occurrences
            .iter()
            .filter(|o| {
                let ok = is_valid_range(text, o.start, o.end);
                if !ok {
                    trace!(term = %o.term, start = o.start, end = o.end, "ignoring out-of-range occurrence");
                }
                ok
            })
            .collect();

        let mut spans = Vec::new();
        for occurrence in &valid {
            if let Some(weight) = self.terms.get(&occurrence.term) {
                let range = occurrence.start..occurrence.end;
                spans.push(WeightedSpan {
                    range: range.clone(),
                    score: weight.boost,
                    matches: vec![MatchSpan {
                        range,
                        slot: weight.slot,
                    }],
                });
            }
        }

        if !self.phrases.is_empty() {
            let mut by_position: HashMap<usize, Vec<&TermOccurrence>> = HashMap::new();
            for occurrence in &valid {
                by_position
                    .entry(occurrence.position)
                    .or_default()
                    .push(occurrence);
            }
            for phrase in &self.phrases {
                spans.extend(phrase_spans(phrase, &valid, &by_position));
            }
        }

        spans.sort_by_key(|s| (s.range.start, s.range.end));
        spans
    }
}

/// Finds the occurrences of one phrase: its terms at consecutive positions.
fn phrase_spans(
    phrase: &PhraseWeight,
    occurrences: &[&TermOccurrence],
    by_position: &HashMap<usize, Vec<&TermOccurrence>>,
) -> Vec<WeightedSpan> {
    let Some((first, rest)) = phrase.terms.split_first() else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    for head in occurrences.iter().filter(|o| &o.term == first) {
        let mut matched = vec![*head];
        for (offset, term) in rest.iter().enumerate() {
            let next = by_position
                .get(&(head.position + offset + 1))
                .and_then(|at| at.iter().find(|o| &o.term == term));
            match next {
                Some(occurrence) => matched.push(occurrence),
                None => break,
            }
        }
        if matched.len() != phrase.terms.len() {
            continue;
        }

        let start = head.start;
        let end = matched.iter().map(|o| o.end).max().unwrap_or(head.end);
        spans.push(WeightedSpan {
            range: start..end,
            score: phrase.boost * phrase.terms.len() as f32,
            matches: matched
                .iter()
                .map(|o| MatchSpan {
                    range: o.start..o.end,
                    slot: phrase.slot,
                })
                .collect(),
        });
    }
    spans
}

#[cfg(test)]
mod tests {
    use glint_query::{BooleanClause, ExtractContext, QueryNode, extract_terms};
    use tantivy::tokenizer::Language;

    use super::*;
    use crate::{build_analyzer, vector::tokenize};

    /// Extracts terms from a query.
    fn extracted(query: &QueryNode) -> ExtractedTerms {
        extract_terms(query, &ExtractContext::default())
    }

    #[test]
    fn field_match_filters_other_fields() {
        let terms = extracted(&QueryNode::boolean(vec![
            BooleanClause::should(QueryNode::term("title", "rust")),
            BooleanClause::should(QueryNode::term("body", "tag1")),
        ]));

        assert_eq!(FieldTerms::for_field(&terms, "body", true).slots(), 1);
        assert_eq!(FieldTerms::for_field(&terms, "body", false).slots(), 2);
    }

    #[test]
    fn same_text_in_two_fields_shares_a_slot() {
        let terms = extracted(&QueryNode::boolean(vec![
            BooleanClause::should(QueryNode::term("title", "rust")),
            BooleanClause::should(QueryNode::term("body", "rust")),
        ]));
        assert_eq!(FieldTerms::for_field(&terms, "body", false).slots(), 1);
    }

    #[test]
    fn slots_follow_sorted_term_order() {
        let terms = extracted(&QueryNode::boolean(vec![
            BooleanClause::should(QueryNode::term("body", "zeta")),
            BooleanClause::should(QueryNode::term("body", "alpha")),
        ]));
        let field_terms = FieldTerms::for_field(&terms, "body", true);
        let text = "zeta alpha";
        let analyzer = build_analyzer(Language::English);
        let spans = field_terms.find_spans(text, &tokenize(&analyzer, 0, text));

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].matches[0].slot, 1);
        assert_eq!(spans[1].matches[0].slot, 0);
    }

    #[test]
    fn phrases_need_consecutive_positions() {
        let terms = extracted(&QueryNode::phrase("body", ["quick", "fox"]));
        let field_terms = FieldTerms::for_field(&terms, "body", true);
        let analyzer = build_analyzer(Language::English);

        let text = "the quick fox and the quick brown fox";
        let spans = field_terms.find_spans(text, &tokenize(&analyzer, 0, text));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].range, 4..13);
        assert_eq!(spans[0].score, 2.0);
        assert_eq!(spans[0].matches.len(), 2);
    }

    #[test]
    fn boost_weights_each_occurrence() {
        let mut terms = ExtractedTerms::default();
        terms.insert_term(HighlightTerm::new("body", "tag1").with_boost(2.5));
        let field_terms = FieldTerms::for_field(&terms, "body", true);
        let analyzer = build_analyzer(Language::English);

        let text = "tag1 and tag1";
        let spans = field_terms.find_spans(text, &tokenize(&analyzer, 0, text));
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.score == 2.5));
    }

    #[test]
    fn invalid_offsets_are_ignored() {
        let terms = extracted(&QueryNode::term("body", "tag1"));
        let field_terms = FieldTerms::for_field(&terms, "body", true);
        let occurrences = vec![TermOccurrence {
            term: "tag1".into(),
            value: 0,
            position: 0,
            start: 3,
            end: 40,
        }];
        assert!(field_terms.find_spans("short", &occurrences).is_empty());
    }
}
