//! JSON settings file: tool sources plus search configuration.
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "time": { "type": "stdio", "command": "uvx", "args": ["mcp-server-time"] },
//!     "search": { "type": "sse", "url": "https://tools.example/sse" }
//!   },
//!   "toolSearch": { "defaultLimit": 5, "chunkSize": 25 }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ConfigResult, ToolSearchConfig};
use crate::mcp::McpServerConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub mcp_servers: HashMap<String, McpServerConfig>,
    pub tool_search: ToolSearchConfig,
}

impl Settings {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.tool_search.validate()?;
        Ok(settings)
    }

    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let settings = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            servers = settings.mcp_servers.len(),
            "Loaded settings"
        );
        Ok(settings)
    }
}
