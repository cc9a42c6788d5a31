//! Fragment selection.
//!
//! Two strategies turn the matches of one value into scored candidates:
//! - [`positions`] groups precomputed term occurrences into fragment lists
//! - [`analyzed`] scores windows around the tokens of a re-analyzed value
//!
//! Both share [`pick_best`] for the final choice.

pub mod analyzed;
pub mod positions;

use std::cmp::Ordering;

use crate::fragment::FragmentCandidate;

/// Picks at most `max` candidates with a positive score.
///
/// Candidates are ranked by score, highest first, with the earliest start winning
/// ties. The chosen candidates are returned in text order.
pub fn pick_best(mut candidates: Vec<FragmentCandidate>, max: usize) -> Vec<FragmentCandidate> {
    candidates.retain(|c| c.score > 0.0);
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.start.cmp(&b.start))
    });
    candidates.truncate(max);
    candidates.sort_by_key(|c| c.start);
    candidates
}
