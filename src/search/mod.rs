//! Tool search: BM25 relevance ranking and bounded regex matching over a
//! catalog that grows and shrinks while it is being queried.

mod bm25;
mod entry;
mod error;
mod manager;
mod mode;
mod pattern;
mod result;
mod tokenizer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bm25::{Bm25Index, Bm25Params, DEFAULT_B, DEFAULT_K1, IndexStats, TIE_EPSILON};
pub use entry::{CatalogEntry, ID_SEPARATOR, ToolArgument, ToolIdentifier, extract_arguments};
pub use error::{MatchErrorCode, SearchError, SearchResultSet};
pub use manager::{PreparedTools, ToolSearchManager};
pub use mode::SearchMode;
pub use pattern::{CASE_INSENSITIVE_PREFIX, MAX_PATTERN_LENGTH, search_with_regex};
pub use result::{SearchResult, signature};
pub use tokenizer::tokenize;
