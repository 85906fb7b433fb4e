//! MCP-facing boundary: raw tool descriptors, source configuration and the
//! discovery manager that feeds the search index.

pub mod events;
pub mod manager;
pub mod source;

pub use events::{CatalogEvent, DiscoveryReport};
pub use manager::McpManager;
pub use source::{SourceConnector, StaticConnector, StaticToolSource, ToolSource};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to reach an upstream tool provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpServerConfig {
    /// Local process speaking over stdin/stdout
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
    },
    /// Remote server reached over Server-Sent Events
    Sse {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

impl McpServerConfig {
    pub fn stdio(command: impl Into<String>) -> Self {
        Self::Stdio {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    pub fn sse(url: impl Into<String>) -> Self {
        Self::Sse {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    pub fn is_local(&self) -> bool {
        match self {
            Self::Stdio { .. } => true,
            Self::Sse { .. } => false,
        }
    }

    /// Short human-readable target for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Stdio { command, args, .. } if args.is_empty() => command.clone(),
            Self::Stdio { command, args, .. } => format!("{} {}", command, args.join(" ")),
            Self::Sse { url, .. } => url.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum McpConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Failed,
}

/// A tool as reported by its origin server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: serde_json::Value,
}

impl McpToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    pub fn estimated_tokens(&self) -> usize {
        estimate_tool_tokens(&self.name, &self.description, &self.input_schema)
    }
}

/// Estimate token count for a tool based on name, description, and schema sizes.
///
/// Uses a chars/4 heuristic (roughly 4 characters per token) plus a fixed
/// overhead of 20 tokens for JSON structure.
pub fn estimate_tool_tokens(name: &str, description: &str, schema: &serde_json::Value) -> usize {
    name.len() / 4 + description.len() / 4 + schema.to_string().len() / 4 + 20
}

/// Tool definition handed to the outer request layer, keyed by the
/// combined identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defer_loading: Option<bool>,
}

impl ToolDefinition {
    pub fn from_mcp(qualified_name: impl Into<String>, tool: &McpToolDefinition) -> Self {
        Self {
            name: qualified_name.into(),
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
            defer_loading: None,
        }
    }

    pub fn deferred(mut self) -> Self {
        self.defer_loading = Some(true);
        self
    }

    pub fn is_deferred(&self) -> bool {
        self.defer_loading.unwrap_or(false)
    }

    pub fn estimated_tokens(&self) -> usize {
        estimate_tool_tokens(&self.name, &self.description, &self.input_schema)
    }
}

#[derive(Clone, Debug)]
pub struct McpServerState {
    pub name: String,
    pub config: McpServerConfig,
    pub status: McpConnectionStatus,
    pub tool_names: Vec<String>,
}

impl McpServerState {
    pub fn new(name: impl Into<String>, config: McpServerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            status: McpConnectionStatus::Connecting,
            tool_names: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == McpConnectionStatus::Connected
    }
}

#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("Server not found: {name}")]
    ServerNotFound { name: String },

    #[error("Server '{name}' already exists")]
    DuplicateServer { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type McpResult<T> = std::result::Result<T, McpError>;
