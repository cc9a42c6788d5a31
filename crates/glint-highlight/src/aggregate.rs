//! Aggregation of per-value fragments into one field result.
//!
//! A multi-valued field is treated as one logical text: the values laid end to end.
//! Candidates of every value are shifted into that space, optionally ordered by
//! score, capped and then emitted either as offsets or as highlighted text.

use std::cmp::Ordering;

use glint_config::{FragmentOrder, HighlightOptions};
use serde::{Deserialize, Serialize};

use crate::{fragment::FragmentCandidate, format::highlight_fragment};

/// A highlighted range in the logical text of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightOffsets {
    /// Start character offset.
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
}

impl HighlightOffsets {
    /// Creates an offsets pair.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The highlight result of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatedHighlight {
    /// Ranges only, for offsets-only requests.
    Offsets(Vec<HighlightOffsets>),
    /// Highlighted fragment text.
    Fragments(Vec<String>),
}

impl AggregatedHighlight {
    /// Returns true if nothing was highlighted.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Offsets(offsets) => offsets.is_empty(),
            Self::Fragments(fragments) => fragments.is_empty(),
        }
    }
}

/// One value of a field with the candidates selected in it.
#[derive(Debug, Clone)]
pub struct ValueFragments<'a> {
    /// The value text.
    pub text: &'a str,
    /// Candidates, in value-local offsets.
    pub candidates: Vec<FragmentCandidate>,
}

/// A candidate placed in the field's logical text.
struct Placed<'a> {
    /// Value the candidate was selected in.
    text: &'a str,
    /// Character length of all preceding values.
    base: usize,
    /// The candidate, in value-local offsets.
    candidate: FragmentCandidate,
}

/// Combines the fragments of every value of a field.
///
/// - Offsets are in characters; value `i` is shifted by the summed character
///   lengths of values `0..i`
/// - With score order, candidates are sorted by descending score, ties by start
/// - Offsets keep at most `max(1, number_of_fragments)` results
/// - Text fragments with `number_of_fragments == 0` and several values are joined
///   into one, separated by a space; otherwise the same cap applies
pub fn aggregate(values: &[ValueFragments<'_>], options: &HighlightOptions) -> AggregatedHighlight {
    let mut placed = Vec::new();
    let mut base = 0;
    for value in values {
        for candidate in &value.candidates {
            placed.push(Placed {
                text: value.text,
                base,
                candidate: candidate.clone(),
            });
        }
        base += value.text.chars().count();
    }

    if options.order == FragmentOrder::Score {
        placed.sort_by(|a, b| {
            b.candidate
                .score
                .partial_cmp(&a.candidate.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| (a.base, a.candidate.start).cmp(&(b.base, b.candidate.start)))
        });
    }

    let limit = options.number_of_fragments.max(1);
    if options.offsets_only {
        placed.truncate(limit);
        return AggregatedHighlight::Offsets(
            placed
                .iter()
                .map(|p| {
                    HighlightOffsets::new(
                        p.base + char_offset(p.text, p.candidate.start),
                        p.base + char_offset(p.text, p.candidate.end),
                    )
                })
                .collect(),
        );
    }

    let join = options.number_of_fragments == 0 && values.len() > 1 && !placed.is_empty();
    if !join {
        placed.truncate(limit);
    }

    let fragments: Vec<String> = placed
        .iter()
        .map(|p| highlight_fragment(p.text, &p.candidate, options))
        .collect();
    if join {
        AggregatedHighlight::Fragments(vec![fragments.join(" ")])
    } else {
        AggregatedHighlight::Fragments(fragments)
    }
}

/// Number of characters in `text` before byte offset `byte`.
fn char_offset(text: &str, byte: usize) -> usize {
    text.char_indices().take_while(|(i, _)| *i < byte).count()
}
