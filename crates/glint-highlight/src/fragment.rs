//! Matched spans and fragment candidates.
//!
//! All offsets are byte offsets into a single field value, on `char` boundaries.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One highlighted run of text inside a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    /// Byte range of the match.
    pub range: Range<usize>,
    /// Index of the distinct query term that matched; selects the tag pair.
    pub slot: usize,
}

/// A scored occurrence of a query term or phrase in a value.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSpan {
    /// Byte range from the first to the last matched token.
    pub range: Range<usize>,
    /// Sum of the weights of the matched terms.
    pub score: f32,
    /// The individual token matches (one per term, several for a phrase).
    pub matches: Vec<MatchSpan>,
}

/// A candidate excerpt of a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentCandidate {
    /// Start of the excerpt.
    pub start: usize,
    /// End of the excerpt (exclusive).
    pub end: usize,
    /// Sum of the scores of the spans inside the excerpt.
    pub score: f32,
    /// Matches inside the excerpt, sorted by start.
    pub matches: Vec<MatchSpan>,
}

impl FragmentCandidate {
    /// Builds a candidate over `start..end` from every span lying entirely inside it.
    pub fn from_spans(start: usize, end: usize, spans: &[WeightedSpan]) -> Self {
        let mut score = 0.0;
        let mut matches = Vec::new();
        for span in spans
            .iter()
            .filter(|s| s.range.start >= start && s.range.end <= end)
        {
            score += span.score;
            matches.extend(span.matches.iter().cloned());
        }
        matches.sort_by_key(|m| (m.range.start, m.range.end));
        Self {
            start,
            end,
            score,
            matches,
        }
    }

    /// Returns the excerpt's byte range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns true if the two excerpts share at least one byte.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}
