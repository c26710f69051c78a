//! Relevance ranking for autocomplete.
//!
//! Case-insensitive comparison of `display_name` against the trimmed query:
//! exact 100, prefix 80, substring 60, anything else 20. No punctuation or
//! diacritic folding. Sorting is stable so equal scores keep scope order.

use std::cmp::Reverse;

use cardsearch_core::SearchResult;

pub const EXACT: u32 = 100;
pub const PREFIX: u32 = 80;
pub const SUBSTRING: u32 = 60;
pub const FALLBACK: u32 = 20;

pub fn score(display_name: &str, query: &str) -> u32 {
    let name = display_name.to_lowercase();
    let query = query.trim().to_lowercase();
    if name == query {
        EXACT
    } else if name.starts_with(&query) {
        PREFIX
    } else if name.contains(&query) {
        SUBSTRING
    } else {
        FALLBACK
    }
}

/// Ranked copy of `results`; the input is left untouched.
pub fn rank(results: &[SearchResult], query: &str) -> Vec<SearchResult> { rank_owned(results.to_vec(), query) }

pub fn rank_owned(mut results: Vec<SearchResult>, query: &str) -> Vec<SearchResult> {
    results.sort_by_cached_key(|r| Reverse(score(&r.display_name, query)));
    results
}
