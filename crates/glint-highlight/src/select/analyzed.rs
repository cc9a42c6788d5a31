//! Analyzer-based fragment selection.
//!
//! Used when no term vector is available: the value is re-tokenized, every match
//! gets a window of the fragment size centred on it, and the best windows that do
//! not overlap are kept.

use std::{cmp::Ordering, slice};

use crate::{
    fragment::{FragmentCandidate, WeightedSpan},
    ranges::{ceil_char_boundary, floor_char_boundary},
    vector::TermOccurrence,
};

/// Selects the best fragments of one value.
///
/// - `max_fragments == 0` yields the whole value as one fragment
/// - `fragment_size == 0` yields every match as its own fragment
///
/// `tokens` are the value's token occurrences; window edges never split a token.
pub fn select(
    text: &str,
    spans: &[WeightedSpan],
    tokens: &[TermOccurrence],
    fragment_size: usize,
    max_fragments: usize,
) -> Vec<FragmentCandidate> {
    if spans.is_empty() {
        return Vec::new();
    }
    if max_fragments == 0 {
        return vec![FragmentCandidate::from_spans(0, text.len(), spans)];
    }

    let windows = spans
        .iter()
        .map(|span| {
            if fragment_size == 0 {
                FragmentCandidate::from_spans(
                    span.range.start,
                    span.range.end,
                    slice::from_ref(span),
                )
            } else {
                let (start, end) = window_around(text, span, tokens, fragment_size);
                FragmentCandidate::from_spans(start, end, spans)
            }
        })
        .collect();

    pick_disjoint(windows, max_fragments)
}

/// Returns the window of `fragment_size` bytes centred on `span`.
///
/// A window clipped by the end of the text is shifted back so it keeps its size.
fn window_around(
    text: &str,
    span: &WeightedSpan,
    tokens: &[TermOccurrence],
    fragment_size: usize,
) -> (usize, usize) {
    let size = fragment_size.max(span.range.len());
    let slack = size - span.range.len();

    let mut start = span.range.start.saturating_sub(slack / 2);
    let end = (start + size).min(text.len());
    if end - start < size {
        start = end.saturating_sub(size);
    }

    // Widen to whole tokens.
    for token in tokens {
        if token.start < start && start < token.end {
            start = token.start;
        }
    }
    let end = tokens
        .iter()
        .find(|t| t.start < end && end < t.end)
        .map_or(end, |t| t.end);

    (
        floor_char_boundary(text, start),
        ceil_char_boundary(text, end),
    )
}

/// Keeps at most `max` windows with a positive score, best first, skipping any
/// window that overlaps one already kept. The result is in text order.
fn pick_disjoint(mut windows: Vec<FragmentCandidate>, max: usize) -> Vec<FragmentCandidate> {
    windows.retain(|w| w.score > 0.0);
    windows.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.start.cmp(&b.start))
    });

    let mut kept: Vec<FragmentCandidate> = Vec::new();
    for window in windows {
        if kept.len() == max {
            break;
        }
        if kept.iter().all(|k| !k.overlaps(&window)) {
            kept.push(window);
        }
    }

    kept.sort_by_key(|c| c.start);
    kept
}
