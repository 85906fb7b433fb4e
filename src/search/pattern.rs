//! Length-bounded regex matching over a snapshot of catalog entries.

use std::borrow::Borrow;

use regex::RegexBuilder;

use super::entry::CatalogEntry;
use super::error::{SearchError, SearchResultSet};
use super::result::SearchResult;

pub const MAX_PATTERN_LENGTH: usize = 200;

/// Leading marker that switches the remainder of the pattern to
/// case-insensitive matching.
pub const CASE_INSENSITIVE_PREFIX: &str = "(?i)";

/// Matches `pattern` anywhere in each entry's searchable text.
///
/// Every match scores `1.0`; matches are ordered by identifier and cut to
/// `limit`. An empty pattern matches every entry.
pub fn search_with_regex<I>(
    entries: I,
    pattern: &str,
    limit: usize,
) -> SearchResultSet<Vec<SearchResult>>
where
    I: IntoIterator,
    I::Item: Borrow<CatalogEntry>,
{
    let length = pattern.chars().count();
    if length > MAX_PATTERN_LENGTH {
        return Err(SearchError::PatternTooLong {
            length,
            max: MAX_PATTERN_LENGTH,
        });
    }

    let (body, case_insensitive) = match pattern.strip_prefix(CASE_INSENSITIVE_PREFIX) {
        Some(rest) => (rest, true),
        None => (pattern, false),
    };

    let regex = RegexBuilder::new(body)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| SearchError::InvalidPattern {
            message: e.to_string(),
        })?;

    let mut hits: Vec<SearchResult> = entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.borrow();
            regex
                .is_match(&entry.searchable_text)
                .then(|| SearchResult::from_entry(entry, 1.0))
        })
        .collect();

    hits.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
    hits.truncate(limit);
    Ok(hits)
}
