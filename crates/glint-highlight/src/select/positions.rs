//! Position-based fragment selection.
//!
//! Used when the index stored term vectors with positions and offsets. Matched
//! spans are grouped into fragment lists: each fragment opens a little before its
//! first span and extends to the fragment size, taking every further span that fits.
//! Fragment edges are then moved to nearby word boundaries.

use glint_config::{HighlightOptions, MIN_FRAGMENT_SIZE};

use super::pick_best;
use crate::{
    fragment::{FragmentCandidate, WeightedSpan},
    ranges::{ceil_char_boundary, floor_char_boundary, scan_end_boundary, scan_start_boundary},
};

/// Bytes of context before the first span of a simple fragment.
const SIMPLE_MARGIN: usize = 6;

/// How spans are grouped into fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragListKind {
    /// Fixed margin before the first span.
    Simple,
    /// Configured margin before the first span.
    Margin(usize),
    /// The whole value as one fragment.
    Single,
}

impl FragListKind {
    /// Picks the fragment list for a field's options.
    pub fn for_options(options: &HighlightOptions) -> Self {
        if options.number_of_fragments == 0 {
            Self::Single
        } else {
            options.fragment_offset.map_or(Self::Simple, Self::Margin)
        }
    }

    /// Context kept before the first span, never the whole fragment.
    fn margin(self, fragment_size: usize) -> usize {
        match self {
            Self::Simple => SIMPLE_MARGIN,
            Self::Margin(margin) => margin.min(fragment_size.saturating_sub(1)),
            Self::Single => 0,
        }
    }
}

/// Groups the spans of one value into fragment candidates.
///
/// `spans` must be sorted by start. Fragment sizes below [`MIN_FRAGMENT_SIZE`] are
/// raised to it.
pub fn build_frag_list(
    kind: FragListKind,
    text: &str,
    spans: &[WeightedSpan],
    fragment_size: usize,
) -> Vec<FragmentCandidate> {
    if spans.is_empty() {
        return Vec::new();
    }
    if kind == FragListKind::Single {
        return vec![FragmentCandidate::from_spans(0, text.len(), spans)];
    }

    let size = fragment_size.max(MIN_FRAGMENT_SIZE);
    let margin = kind.margin(size);
    let mut candidates = Vec::new();
    let mut next_start = 0;
    let mut i = 0;

    while i < spans.len() {
        let first = &spans[i];
        if first.range.start < next_start {
            i += 1;
            continue;
        }

        let start = first.range.start.saturating_sub(margin).max(next_start);
        let start = floor_char_boundary(text, start);
        let end = ceil_char_boundary(text, (start + size).max(first.range.end));

        let start = scan_start_boundary(text, start, next_start);
        let end = scan_end_boundary(text, end);

        let taken = spans[i..]
            .iter()
            .take_while(|s| s.range.end <= end)
            .count()
            .max(1);
        candidates.push(FragmentCandidate::from_spans(start, end, &spans[i..i + taken]));

        i += taken;
        next_start = end;
    }

    candidates
}

/// Selects the best fragments of one value from its matched spans.
pub fn select(
    kind: FragListKind,
    text: &str,
    spans: &[WeightedSpan],
    fragment_size: usize,
    max_fragments: usize,
) -> Vec<FragmentCandidate> {
    pick_best(
        build_frag_list(kind, text, spans, fragment_size),
        max_fragments.max(1),
    )
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use super::*;
    use crate::fragment::MatchSpan;

    /// A single-term span with weight 1.
    fn span(range: Range<usize>) -> WeightedSpan {
        WeightedSpan {
            range: range.clone(),
            score: 1.0,
            matches: vec![MatchSpan { range, slot: 0 }],
        }
    }

    #[test]
    fn kind_follows_options() {
        let mut options = HighlightOptions::default();
        assert_eq!(FragListKind::for_options(&options), FragListKind::Simple);
        options.fragment_offset = Some(3);
        assert_eq!(FragListKind::for_options(&options), FragListKind::Margin(3));
        options.number_of_fragments = 0;
        assert_eq!(FragListKind::for_options(&options), FragListKind::Single);
    }

    #[test]
    fn simple_fragment_opens_with_margin() {
        let text = "a".repeat(100);
        let candidates = build_frag_list(FragListKind::Simple, &text, &[span(40..45)], 20);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].range(), 34..54);
        assert_eq!(candidates[0].score, 1.0);
    }

    #[test]
    fn nearby_spans_share_a_fragment() {
        let text = "a".repeat(100);
        let spans = [span(10..14), span(20..24), span(60..64)];
        let candidates = build_frag_list(FragListKind::Simple, &text, &spans, 20);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].range(), 0..24);
        assert_eq!(candidates[0].score, 2.0);
        assert_eq!(candidates[1].range(), 54..74);
    }

    #[test]
    fn margin_fragment_uses_configured_offset() {
        let text = "a".repeat(100);
        let candidates = build_frag_list(FragListKind::Margin(2), &text, &[span(40..45)], 30);
        assert_eq!(candidates[0].range(), 38..68);
    }

    #[test]
    fn small_sizes_are_raised_to_minimum() {
        let text = "a".repeat(100);
        let candidates = build_frag_list(FragListKind::Simple, &text, &[span(40..45)], 1);
        assert_eq!(candidates[0].range().len(), MIN_FRAGMENT_SIZE);
    }

    #[test]
    fn fragments_stay_inside_the_value() {
        let text = "short value with tag1";
        let candidates = build_frag_list(FragListKind::Simple, text, &[span(17..21)], 100);
        assert_eq!(candidates[0].range(), 6..21);
    }

    #[test]
    fn fragment_reaching_text_start_opens_there() {
        let text = "foo bar tag1 stuff and other things";
        let candidates = build_frag_list(FragListKind::Simple, text, &[span(8..12)], 100);
        assert_eq!(candidates[0].range(), 0..text.len());
    }

    #[test]
    fn single_covers_whole_value() {
        let text = "alpha tag1 beta tag1";
        let candidates =
            build_frag_list(FragListKind::Single, text, &[span(6..10), span(16..20)], 100);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].range(), 0..text.len());
        assert_eq!(candidates[0].matches.len(), 2);
        assert!(build_frag_list(FragListKind::Single, text, &[], 100).is_empty());
    }

    #[test]
    fn select_caps_fragment_count() {
        let text = "a".repeat(200);
        let spans = [span(10..14), span(60..64), span(110..114), span(160..164)];
        let picked = select(FragListKind::Simple, &text, &spans, 20, 2);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].start, 0);
        assert_eq!(picked[1].start, 54);
    }
}
