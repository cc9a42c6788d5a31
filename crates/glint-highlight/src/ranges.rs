//! Byte range utilities: span merging and `char` boundary snapping.

use crate::fragment::MatchSpan;

/// Merges match spans, combining overlapping or adjacent ones.
///
/// The result is sorted by start with no overlaps; a merged span keeps the slot of
/// its earliest part.
pub fn merge_spans(mut spans: Vec<MatchSpan>) -> Vec<MatchSpan> {
    if spans.is_empty() {
        return spans;
    }

    spans.sort_by_key(|s| s.range.start);

    let mut merged: Vec<MatchSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(current) if span.range.start <= current.range.end => {
                current.range.end = current.range.end.max(span.range.end);
            }
            _ => merged.push(span),
        }
    }

    merged
}

/// Moves `index` back to the nearest `char` boundary of `text`, clamped to its length.
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Moves `index` forward to the nearest `char` boundary of `text`, clamped to its length.
pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Characters a fragment may start after or end before.
const BOUNDARY_CHARS: &[u8] = b".,!? \t\n";

/// How far a fragment edge may move to reach a boundary.
const MAX_BOUNDARY_SCAN: usize = 20;

/// Moves a fragment start back to just after a boundary character.
///
/// Scans at most a few bytes and never below `floor`. Reaching the start of the
/// text counts as a boundary; otherwise, without a boundary, `start` is kept.
pub fn scan_start_boundary(text: &str, start: usize, floor: usize) -> usize {
    let bytes = text.as_bytes();
    if start > bytes.len() {
        return start;
    }
    let limit = start.saturating_sub(MAX_BOUNDARY_SCAN).max(floor);
    let mut offset = start;
    while offset > limit {
        if BOUNDARY_CHARS.contains(&bytes[offset - 1]) {
            return offset;
        }
        offset -= 1;
    }
    if offset == 0 { 0 } else { start }
}

/// Moves a fragment end forward to the next boundary character, or the end of the
/// text, if one is within reach; otherwise `end` is kept.
pub fn scan_end_boundary(text: &str, end: usize) -> usize {
    let bytes = text.as_bytes();
    let limit = (end + MAX_BOUNDARY_SCAN).min(bytes.len());
    (end..limit)
        .find(|&i| BOUNDARY_CHARS.contains(&bytes[i]))
        .unwrap_or(if limit == bytes.len() && end <= limit { limit } else { end })
}

/// Returns true if `start..end` is a non-empty slice of `text` on `char` boundaries.
pub fn is_valid_range(text: &str, start: usize, end: usize) -> bool {
    start < end && end <= text.len() && text.is_char_boundary(start) && text.is_char_boundary(end)
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use super::*;

    /// Builds spans with increasing slots.
    fn spans(ranges: &[Range<usize>]) -> Vec<MatchSpan> {
        ranges
            .iter()
            .enumerate()
            .map(|(slot, range)| MatchSpan {
                range: range.clone(),
                slot,
            })
            .collect()
    }

    #[test]
    fn merge_spans_combines_overlapping() {
        let merged = merge_spans(spans(&[10..15, 0..5, 3..8, 20..25]));
        let ranges: Vec<_> = merged.iter().map(|s| s.range.clone()).collect();
        assert_eq!(ranges, vec![0..8, 10..15, 20..25]);
        assert_eq!(merged[0].slot, 1);
    }

    #[test]
    fn merge_spans_combines_adjacent() {
        let merged = merge_spans(spans(&[0..5, 5..10]));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].range, 0..10);
    }

    #[test]
    fn merge_spans_handles_empty() {
        assert!(merge_spans(Vec::new()).is_empty());
    }

    #[test]
    fn boundaries_snap_around_multibyte_chars() {
        let text = "aé b";
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(ceil_char_boundary(text, 2), 3);
        assert_eq!(ceil_char_boundary(text, 99), text.len());
        assert!(is_valid_range(text, 1, 3));
        assert!(!is_valid_range(text, 2, 3));
        assert!(!is_valid_range(text, 3, 3));
    }

    #[test]
    fn start_boundary_scans_back_to_whitespace() {
        let text = "short value with tag1";
        assert_eq!(scan_start_boundary(text, 11, 0), 6);
        assert_eq!(scan_start_boundary(text, 11, 8), 11);
        assert_eq!(scan_start_boundary("foo bar", 2, 0), 0);
        assert_eq!(scan_start_boundary(&"a".repeat(50), 40, 0), 40);
    }

    #[test]
    fn end_boundary_scans_forward() {
        assert_eq!(scan_end_boundary("one two three", 5), 7);
        assert_eq!(scan_end_boundary("one two", 5), 7);
        let long = "a".repeat(50);
        assert_eq!(scan_end_boundary(&long, 10), 10);
    }
}
