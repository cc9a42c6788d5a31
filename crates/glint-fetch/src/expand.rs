//! Term dictionary expansion helpers shared by the document sources.

use std::sync::OnceLock;

use glint_query::{RewriteError, TermPattern};
use levenshtein_automata::{DFA, Distance, LevenshteinAutomatonBuilder, SINK_STATE};
use tantivy_fst::Automaton;

/// Largest edit distance a fuzzy pattern may ask for.
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// Wrapper that implements `tantivy_fst::Automaton` for `levenshtein_automata::DFA`.
pub(crate) struct LevenshteinDfa(pub(crate) DFA);

impl Automaton for LevenshteinDfa {
    type State = u32;

    fn start(&self) -> Self::State {
        self.0.initial_state()
    }

    fn is_match(&self, state: &Self::State) -> bool {
        matches!(self.0.distance(*state), Distance::Exact(_))
    }

    fn can_match(&self, state: &Self::State) -> bool {
        *state != SINK_STATE
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        self.0.transition(*state, byte)
    }
}

/// Builds the Levenshtein automaton of a fuzzy pattern.
///
/// Builders are expensive to create and are kept for the life of the process, one
/// per distance.
pub(crate) fn fuzzy_dfa(term: &str, distance: u8) -> Result<DFA, RewriteError> {
    /// Builders by distance, with transpositions counted as one edit.
    static BUILDERS: [OnceLock<LevenshteinAutomatonBuilder>; MAX_FUZZY_DISTANCE as usize + 1] =
        [OnceLock::new(), OnceLock::new(), OnceLock::new()];

    let builder = BUILDERS
        .get(usize::from(distance))
        .ok_or_else(|| RewriteError::InvalidPattern {
            pattern: format!("{term}~{distance}"),
            message: format!("edit distance must be at most {MAX_FUZZY_DISTANCE}"),
        })?
        .get_or_init(|| LevenshteinAutomatonBuilder::new(distance, true));
    Ok(builder.build_dfa(term))
}

/// Returns true if `term` is within the automaton's distance.
pub(crate) fn fuzzy_matches(dfa: &DFA, term: &str) -> bool {
    matches!(dfa.eval(term), Distance::Exact(_))
}

/// Returns the literal part of a wildcard pattern before its first `*` or `?`.
pub fn literal_prefix(pattern: &str) -> &str {
    pattern
        .find(['*', '?'])
        .map_or(pattern, |index| &pattern[..index])
}

/// Returns true if `term` matches a wildcard pattern.
///
/// `*` matches any run of characters, including none; `?` matches exactly one.
pub fn wildcard_matches(pattern: &str, term: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let term: Vec<char> = term.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < term.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == term[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Collects expanded terms, failing once more than `max_terms` have been seen.
pub(crate) struct Expansion<'a> {
    /// Field being expanded.
    field: &'a str,
    /// Pattern being expanded.
    pattern: &'a TermPattern<'a>,
    /// Ceiling on the number of terms.
    max_terms: usize,
    /// Terms collected so far.
    terms: Vec<String>,
}

impl<'a> Expansion<'a> {
    /// Starts an expansion.
    pub(crate) fn new(field: &'a str, pattern: &'a TermPattern<'a>, max_terms: usize) -> Self {
        Self {
            field,
            pattern,
            max_terms,
            terms: Vec::new(),
        }
    }

    /// Adds a matching term.
    pub(crate) fn push(&mut self, term: &str) -> Result<(), RewriteError> {
        if self.terms.len() == self.max_terms {
            return Err(RewriteError::too_many_clauses(
                self.field,
                self.pattern,
                self.max_terms,
            ));
        }
        self.terms.push(term.to_string());
        Ok(())
    }

    /// Returns the collected terms.
    pub(crate) fn finish(self) -> Vec<String> {
        self.terms
    }
}
