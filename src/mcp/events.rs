//! Catalog progress notifications.

use serde::Serialize;

/// Emitted by [`super::McpManager`] as sources connect and tools become
/// searchable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CatalogEvent {
    ServerConnected { server: String, tool_count: usize },
    ServerFailed { server: String, error: String },
    ToolsIndexed { server: String, added: usize, total: usize },
    ServerRemoved { server: String, removed: usize },
    DiscoveryComplete { connected: usize, failed: usize, total_tools: usize },
}

impl CatalogEvent {
    pub fn server(&self) -> Option<&str> {
        match self {
            Self::ServerConnected { server, .. }
            | Self::ServerFailed { server, .. }
            | Self::ToolsIndexed { server, .. }
            | Self::ServerRemoved { server, .. } => Some(server),
            Self::DiscoveryComplete { .. } => None,
        }
    }
}

/// Outcome of a full discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    pub connected: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub tools_indexed: usize,
}

impl DiscoveryReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}
