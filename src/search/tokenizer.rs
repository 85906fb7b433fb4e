//! Term extraction shared by indexing and querying.

use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]+").unwrap());

/// Lowercases `text`, turns every character that is neither a Unicode word
/// character nor whitespace into a separator, and splits on whitespace.
///
/// Underscores are word characters, so `get_current_time` stays one term.
/// No stopword removal and no stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
