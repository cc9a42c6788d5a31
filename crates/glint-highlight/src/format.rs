//! Fragment text materialization: tag wrapping and encoding.

use glint_config::{Encoder, HighlightOptions};

use crate::{fragment::FragmentCandidate, ranges::merge_spans};

/// Appends `text` to `out`, encoded for output.
fn encode_into(out: &mut String, text: &str, encoder: Encoder) {
    match encoder {
        Encoder::None => out.push_str(text),
        Encoder::Html => {
            for c in text.chars() {
                match c {
                    '&' => out.push_str("&amp;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '"' => out.push_str("&quot;"),
                    '\'' => out.push_str("&#x27;"),
                    _ => out.push(c),
                }
            }
        }
    }
}

/// Returns the tag for `slot`, cycling through `tags`.
fn tag(tags: &[String], slot: usize) -> &str {
    if tags.is_empty() {
        ""
    } else {
        &tags[slot % tags.len()]
    }
}

/// Renders the text of a fragment of `value` with every match wrapped in tags.
///
/// Text is encoded with the field's encoder; tags are emitted as configured.
/// Overlapping matches are merged and take the tags of their earliest part.
pub fn highlight_fragment(
    value: &str,
    candidate: &FragmentCandidate,
    options: &HighlightOptions,
) -> String {
    let FragmentCandidate { start, end, .. } = *candidate;
    let matches = merge_spans(
        candidate
            .matches
            .iter()
            .filter(|m| m.range.start >= start && m.range.end <= end)
            .cloned()
            .collect(),
    );

    let mut out = String::with_capacity(end - start + matches.len() * 10);
    let mut cursor = start;
    for m in &matches {
        encode_into(&mut out, &value[cursor..m.range.start], options.encoder);
        out.push_str(tag(&options.pre_tags, m.slot));
        encode_into(&mut out, &value[m.range.clone()], options.encoder);
        out.push_str(tag(&options.post_tags, m.slot));
        cursor = m.range.end;
    }
    encode_into(&mut out, &value[cursor..end], options.encoder);
    out
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use glint_config::TagsSchema;

    use super::*;
    use crate::fragment::MatchSpan;

    /// A candidate over `range` with the given matches.
    fn candidate(range: Range<usize>, matches: &[(Range<usize>, usize)]) -> FragmentCandidate {
        FragmentCandidate {
            start: range.start,
            end: range.end,
            score: 1.0,
            matches: matches
                .iter()
                .map(|(range, slot)| MatchSpan {
                    range: range.clone(),
                    slot: *slot,
                })
                .collect(),
        }
    }

    #[test]
    fn wraps_matches_in_default_tags() {
        let value = "foo bar tag1 stuff and other things";
        let fragment = highlight_fragment(
            value,
            &candidate(0..value.len(), &[(8..12, 0)]),
            &HighlightOptions::default(),
        );
        assert_eq!(fragment, "foo bar <em>tag1</em> stuff and other things");
    }

    #[test]
    fn fragment_is_a_slice_of_the_value() {
        let value = "alpha beta gamma";
        let fragment = highlight_fragment(
            value,
            &candidate(6..16, &[(6..10, 0)]),
            &HighlightOptions::default(),
        );
        assert_eq!(fragment, "<em>beta</em> gamma");
    }

    #[test]
    fn html_encoder_escapes_text_but_not_tags() {
        let value = "a<b> & tag1";
        let options = HighlightOptions {
            encoder: Encoder::Html,
            ..HighlightOptions::default()
        };
        let fragment = highlight_fragment(value, &candidate(0..value.len(), &[(7..11, 0)]), &options);
        assert_eq!(fragment, "a&lt;b&gt; &amp; <em>tag1</em>");
    }

    #[test]
    fn slots_cycle_through_tags() {
        let value = "one two three";
        let options = HighlightOptions {
            pre_tags: TagsSchema::Styled.pre_tags()[..2].to_vec(),
            post_tags: TagsSchema::Styled.post_tags(),
            ..HighlightOptions::default()
        };
        let fragment = highlight_fragment(
            value,
            &candidate(0..value.len(), &[(0..3, 0), (4..7, 1), (8..13, 2)]),
            &options,
        );
        assert_eq!(
            fragment,
            "<em class=\"hlt1\">one</em> <em class=\"hlt2\">two</em> <em class=\"hlt1\">three</em>"
        );
    }

    #[test]
    fn overlapping_matches_merge() {
        let value = "quick brown fox";
        let fragment = highlight_fragment(
            value,
            &candidate(0..value.len(), &[(0..11, 1), (6..11, 0)]),
            &HighlightOptions::default(),
        );
        assert_eq!(fragment, "<em>quick brown</em> fox");
    }

    #[test]
    fn empty_tag_lists_emit_nothing() {
        let value = "tag1";
        let options = HighlightOptions {
            pre_tags: Vec::new(),
            post_tags: Vec::new(),
            ..HighlightOptions::default()
        };
        let fragment = highlight_fragment(value, &candidate(0..4, &[(0..4, 0)]), &options);
        assert_eq!(fragment, "tag1");
    }
}
