//! Discovery seam: where tool lists come from.
//!
//! Transports, handshakes and retries live with the host. This crate only
//! needs something that can be connected from a [`McpServerConfig`] and then
//! asked for its current tool list.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{McpError, McpResult, McpServerConfig, McpToolDefinition};

#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> McpResult<Vec<McpToolDefinition>>;
}

#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn connect(&self, name: &str, config: &McpServerConfig)
    -> McpResult<Arc<dyn ToolSource>>;
}

/// Fixed tool list held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticToolSource {
    tools: Vec<McpToolDefinition>,
}

impl StaticToolSource {
    pub fn new(tools: Vec<McpToolDefinition>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl ToolSource for StaticToolSource {
    async fn list_tools(&self) -> McpResult<Vec<McpToolDefinition>> {
        Ok(self.tools.clone())
    }
}

/// Connector that serves in-memory tool lists by server name.
///
/// Unknown names fail to connect, which makes it convenient for exercising
/// partial discovery.
#[derive(Debug, Clone, Default)]
pub struct StaticConnector {
    servers: HashMap<String, Vec<McpToolDefinition>>,
}

impl StaticConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(
        mut self,
        name: impl Into<String>,
        tools: impl IntoIterator<Item = McpToolDefinition>,
    ) -> Self {
        self.servers
            .insert(name.into(), tools.into_iter().collect());
        self
    }
}

#[async_trait]
impl SourceConnector for StaticConnector {
    async fn connect(
        &self,
        name: &str,
        _config: &McpServerConfig,
    ) -> McpResult<Arc<dyn ToolSource>> {
        let tools = self
            .servers
            .get(name)
            .ok_or_else(|| McpError::ConnectionFailed {
                message: format!("no tools registered for '{}'", name),
            })?;
        Ok(Arc::new(StaticToolSource::new(tools.clone())))
    }
}
