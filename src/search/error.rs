//! Errors surfaced by the search entry points.

use serde::{Serialize, Serializer, ser::SerializeStruct};

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchErrorCode {
    InvalidPattern,
    PatternTooLong,
    Unavailable,
}

impl MatchErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPattern => "invalid_pattern",
            Self::PatternTooLong => "pattern_too_long",
            Self::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid regex pattern: {message}")]
    InvalidPattern { message: String },

    #[error("Pattern is {length} characters long; the maximum is {max}")]
    PatternTooLong { length: usize, max: usize },

    #[error("Search unavailable: {message}")]
    Unavailable { message: String },
}

impl SearchError {
    pub fn code(&self) -> MatchErrorCode {
        match self {
            Self::InvalidPattern { .. } => MatchErrorCode::InvalidPattern,
            Self::PatternTooLong { .. } => MatchErrorCode::PatternTooLong,
            Self::Unavailable { .. } => MatchErrorCode::Unavailable,
        }
    }
}

impl Serialize for SearchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SearchError", 2)?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type SearchResultSet<T> = std::result::Result<T, SearchError>;
