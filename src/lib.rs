//! # tool-discovery
//!
//! Lazy tool discovery for agents with large, dynamic tool catalogs.
//!
//! Instead of loading every tool definition into a model's context, tools are
//! indexed on connect and fetched on demand through either BM25 relevance
//! ranking or a bounded regular-expression match.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use tool_discovery::{McpToolDefinition, ToolSearchManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tool_discovery::Error> {
//!     let manager = ToolSearchManager::default();
//!     manager
//!         .add_tools_async(
//!             "time",
//!             vec![McpToolDefinition::new(
//!                 "get_current_time",
//!                 "Get current time in a timezone",
//!                 json!({ "type": "object", "properties": {} }),
//!             )],
//!         )
//!         .await;
//!
//!     for hit in manager.search_by_relevance("current time", None).await {
//!         println!("{} {:.3} {}", hit.tool, hit.score, hit.signature);
//!     }
//!
//!     let matches = manager.search_by_pattern("(?i)^time_", Some(10)).await?;
//!     println!("{} regex matches", matches.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Discovery
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tool_discovery::{McpManager, StaticConnector, ToolSearchManager, config::Settings};
//!
//! # async fn example() -> Result<(), tool_discovery::Error> {
//! let settings = Settings::load("tools.json").await?;
//! let search = ToolSearchManager::new(settings.tool_search.clone());
//! let manager = McpManager::new(Arc::new(StaticConnector::new()), search);
//!
//! let mut events = manager.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! });
//!
//! let report = manager.discover_all(settings.mcp_servers).await;
//! println!("{} servers connected", report.connected.len());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod mcp;
pub mod observability;
pub mod search;

pub use config::{ConfigError, Settings, ToolSearchConfig};
pub use mcp::{
    CatalogEvent, DiscoveryReport, McpConnectionStatus, McpError, McpManager, McpResult,
    McpServerConfig, McpServerState, McpToolDefinition, SourceConnector, StaticConnector,
    StaticToolSource, ToolDefinition, ToolSource,
};
pub use observability::{MetricsRegistry, MetricsSummary};
pub use search::{
    Bm25Index, Bm25Params, CatalogEntry, IndexStats, MatchErrorCode, PreparedTools, SearchError,
    SearchMode, SearchResult, ToolArgument, ToolIdentifier, ToolSearchManager, search_with_regex,
    tokenize,
};

/// Error type for tool-discovery operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A search request was rejected.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// A tool source could not be reached or listed.
    #[error("MCP error: {0}")]
    Mcp(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller supplied an unusable query or pattern
    InvalidInput,
    /// Configuration, parsing, or setup errors
    Configuration,
    /// Tool source connection or protocol errors
    Stateful,
    /// Internal errors (IO, JSON)
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Search(SearchError::Unavailable { .. }) => ErrorCategory::Configuration,
            Error::Search(_) => ErrorCategory::InvalidInput,
            Error::Config(_) => ErrorCategory::Configuration,
            Error::Mcp(_) => ErrorCategory::Stateful,
            Error::Json(_) | Error::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        self.category() == ErrorCategory::InvalidInput
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Serialization(e) => Error::Json(e),
            ConfigError::Io(e) => Error::Io(e),
            other => Error::Config(other.to_string()),
        }
    }
}

impl From<McpError> for Error {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Io(e) => Error::Io(e),
            McpError::Json(e) => Error::Json(e),
            _ => Error::Mcp(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
