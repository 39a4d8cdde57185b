//! Derives the visible subset of phrases from a search query.
//!
//! Matching is a case-insensitive literal substring test: the query is
//! escaped before it is compiled, so `"(Hola)"` only matches text that
//! contains the parentheses.

use log::{debug, warn};
use regex::{Regex, RegexBuilder};

use crate::phrase_model::Phrase;

/// Queries shorter than this (after normalization) do not filter.
pub const MIN_QUERY_LEN: usize = 2;

/// Trims and collapses every internal whitespace run to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compiles the literal, case-insensitive matcher for an already normalized query.
pub fn build_matcher(normalized: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(normalized))
        .case_insensitive(true)
        .build()
}

/// Returns the phrases whose normalized text contains the normalized query.
///
/// Short queries return the whole collection, and so does any failure to
/// build the matcher.
pub fn filter_phrases<'a>(phrases: &'a [Phrase], query: &str) -> Vec<&'a Phrase> {
    let normalized = normalize(query);

    if normalized.chars().count() < MIN_QUERY_LEN {
        return phrases.iter().collect();
    }

    let matcher = match build_matcher(&normalized) {
        Ok(m) => m,
        Err(e) => {
            warn!("Search pattern rejected, showing all phrases: {e}");
            return phrases.iter().collect();
        }
    };

    let matches: Vec<&Phrase> = phrases
        .iter()
        .filter(|p| matcher.is_match(&normalize(&p.text)))
        .collect();

    debug!("Query {:?} matched {} of {} phrases", normalized, matches.len(), phrases.len());
    matches
}
