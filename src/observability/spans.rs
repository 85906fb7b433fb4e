//! Structured span definitions for tracing.

use tracing::{Level, Span, span};

use crate::search::SearchMode;

pub fn search_span(mode: SearchMode, query: &str, limit: usize) -> Span {
    span!(
        Level::DEBUG,
        "tool_search.query",
        mode = mode.as_str(),
        query_len = query.chars().count(),
        limit = limit,
    )
}

pub fn index_span(origin: &str, tools: usize, chunk_size: usize) -> Span {
    span!(
        Level::DEBUG,
        "tool_search.index",
        origin = origin,
        tools = tools,
        chunk_size = chunk_size,
    )
}
