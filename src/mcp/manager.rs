//! Drives tool discovery from configured sources into the search index.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use super::events::{CatalogEvent, DiscoveryReport};
use super::source::{SourceConnector, ToolSource};
use super::{
    McpConnectionStatus, McpError, McpResult, McpServerConfig, McpServerState, McpToolDefinition,
    ToolDefinition,
};
use crate::search::{ToolIdentifier, ToolSearchManager};

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct ServerEntry {
    /// Changes on every registration; an in-flight fetch whose generation no
    /// longer matches must not touch the index.
    generation: u64,
    state: McpServerState,
    source: Option<Arc<dyn ToolSource>>,
}

pub struct McpManager {
    connector: Arc<dyn SourceConnector>,
    servers: Arc<RwLock<HashMap<String, ServerEntry>>>,
    search: ToolSearchManager,
    events: broadcast::Sender<CatalogEvent>,
    next_generation: AtomicU64,
}

impl McpManager {
    pub fn new(connector: Arc<dyn SourceConnector>, search: ToolSearchManager) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            connector,
            servers: Arc::new(RwLock::new(HashMap::new())),
            search,
            events,
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn search(&self) -> &ToolSearchManager {
        &self.search
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Connects `name`, lists its tools and indexes them. Tools become
    /// searchable chunk by chunk while this runs.
    ///
    /// Returns how many of the server's tools ended up indexed. A server
    /// removed before its tools arrive indexes nothing and returns `0`.
    pub async fn add_server(
        &self,
        name: impl Into<String>,
        config: McpServerConfig,
    ) -> McpResult<usize> {
        let name = name.into();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        {
            let mut servers = self.servers.write().await;
            if servers.contains_key(&name) {
                return Err(McpError::DuplicateServer { name });
            }
            servers.insert(
                name.clone(),
                ServerEntry {
                    generation,
                    state: McpServerState::new(name.clone(), config.clone()),
                    source: None,
                },
            );
        }

        match self.fetch(&name, &config, None).await {
            Ok((source, tools)) => Ok(self.index_server(&name, generation, source, tools).await),
            Err(e) => {
                self.mark_failed(&name, generation, &e).await;
                Err(e)
            }
        }
    }

    /// Re-lists a server's tools and brings its index entries in line.
    /// Reconnects first if the server never connected.
    ///
    /// Unchanged tools stay searchable throughout. Tools that were dropped
    /// or whose definition changed are removed first, so a changed tool is
    /// briefly absent until its new version is indexed.
    pub async fn refresh_server(&self, name: &str) -> McpResult<usize> {
        let (generation, config, source) = {
            let servers = self.servers.read().await;
            let entry = servers.get(name).ok_or_else(|| McpError::ServerNotFound {
                name: name.to_string(),
            })?;
            (
                entry.generation,
                entry.state.config.clone(),
                entry.source.clone(),
            )
        };

        match self.fetch(name, &config, source).await {
            Ok((source, tools)) => Ok(self.index_server(name, generation, source, tools).await),
            Err(e) => {
                self.mark_failed(name, generation, &e).await;
                Err(e)
            }
        }
    }

    pub async fn remove_server(&self, name: &str) -> McpResult<usize> {
        // Held across the index cleanup so a re-registration under the same
        // name cannot interleave with it.
        let mut servers = self.servers.write().await;
        if servers.remove(name).is_none() {
            return Err(McpError::ServerNotFound {
                name: name.to_string(),
            });
        }
        let removed = self.search.remove_server(name).await;
        drop(servers);

        info!(server = name, removed, "Removed MCP server");
        self.emit(CatalogEvent::ServerRemoved {
            server: name.to_string(),
            removed,
        });
        Ok(removed)
    }

    /// Connects every server concurrently. Failures are reported, not fatal.
    pub async fn discover_all<I>(&self, servers: I) -> DiscoveryReport
    where
        I: IntoIterator<Item = (String, McpServerConfig)>,
    {
        let attempts = servers.into_iter().map(|(name, config)| async move {
            let outcome = self.add_server(name.clone(), config).await;
            (name, outcome)
        });

        let mut report = DiscoveryReport::default();
        for (name, outcome) in join_all(attempts).await {
            match outcome {
                Ok(indexed) => {
                    report.connected.push(name);
                    report.tools_indexed += indexed;
                }
                Err(e) => report.failed.push((name, e.to_string())),
            }
        }
        report.connected.sort();
        report.failed.sort();

        let total_tools = self.search.tool_count().await;
        info!(
            connected = report.connected.len(),
            failed = report.failed.len(),
            total_tools,
            "Tool discovery complete"
        );
        self.emit(CatalogEvent::DiscoveryComplete {
            connected: report.connected.len(),
            failed: report.failed.len(),
            total_tools,
        });
        report
    }

    pub async fn list_servers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn get_server_state(&self, name: &str) -> Option<McpServerState> {
        self.servers
            .read()
            .await
            .get(name)
            .map(|entry| entry.state.clone())
    }

    async fn fetch(
        &self,
        name: &str,
        config: &McpServerConfig,
        source: Option<Arc<dyn ToolSource>>,
    ) -> McpResult<(Arc<dyn ToolSource>, Vec<McpToolDefinition>)> {
        let source = match source {
            Some(source) => source,
            None => self.connector.connect(name, config).await?,
        };
        let tools = source.list_tools().await?;
        Ok((source, tools))
    }

    async fn index_server(
        &self,
        name: &str,
        generation: u64,
        source: Arc<dyn ToolSource>,
        tools: Vec<McpToolDefinition>,
    ) -> usize {
        let tool_count = tools.len();
        {
            let mut servers = self.servers.write().await;
            let Some(entry) = servers
                .get_mut(name)
                .filter(|entry| entry.generation == generation)
            else {
                debug!(server = name, "Server removed before its tools arrived");
                return 0;
            };
            entry.state.status = McpConnectionStatus::Connected;
            entry.source = Some(source);
        }
        info!(server = name, tool_count, "Connected MCP server");
        self.emit(CatalogEvent::ServerConnected {
            server: name.to_string(),
            tool_count,
        });

        for id in self.outdated_tools(name, &tools).await {
            self.search.remove_tool(&id).await;
        }
        let added = self.search.add_tools_async(name, tools).await;

        let indexed = {
            let mut servers = self.servers.write().await;
            match servers.get_mut(name) {
                Some(entry) if entry.generation == generation => {
                    entry.state.tool_names = self.search.origin_tools(name).await;
                    entry.state.tool_names.len()
                }
                // Re-registered meanwhile; the newer registration owns the state.
                Some(_) => 0,
                None => {
                    let orphaned = self.search.remove_server(name).await;
                    debug!(server = name, orphaned, "Server removed while indexing");
                    return 0;
                }
            }
        };

        self.emit(CatalogEvent::ToolsIndexed {
            server: name.to_string(),
            added,
            total: self.search.tool_count().await,
        });
        indexed
    }

    /// Indexed tools of `name` that are missing from `tools` or whose
    /// definition differs from the reported one.
    async fn outdated_tools(&self, name: &str, tools: &[McpToolDefinition]) -> Vec<String> {
        let reported: HashMap<String, &McpToolDefinition> = tools
            .iter()
            .map(|t| (ToolIdentifier::new(name, &t.name).qualified(), t))
            .collect();

        self.search
            .origin_tools(name)
            .await
            .into_iter()
            .filter(|id| match reported.get(id) {
                Some(tool) => {
                    self.search.get_definition(id) != Some(ToolDefinition::from_mcp(id, tool))
                }
                None => true,
            })
            .collect()
    }

    async fn mark_failed(&self, name: &str, generation: u64, error: &McpError) {
        if let Some(entry) = self.servers.write().await.get_mut(name)
            && entry.generation == generation
        {
            entry.state.status = McpConnectionStatus::Failed;
        }
        self.search.metrics().record_discovery_failure();
        warn!(server = name, error = %error, "MCP server discovery failed");
        self.emit(CatalogEvent::ServerFailed {
            server: name.to_string(),
            error: error.to_string(),
        });
    }
}
