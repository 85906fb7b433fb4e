//! Discovery Tests
//!
//! Sources feeding the search index, progress events, settings loading and
//! metrics injection.
//!
//! Run: cargo nextest run --test discovery_tests

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tempfile::tempdir;
use tokio::sync::Notify;
use tool_discovery::{
    CatalogEvent, McpConnectionStatus, McpError, McpManager, McpResult, McpServerConfig,
    McpToolDefinition, MetricsRegistry, SearchMode, SourceConnector, StaticConnector,
    ToolSearchManager, ToolSource,
    config::{MemoryConfigProvider, Settings, ToolSearchConfig},
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn tool(name: &str, description: &str) -> McpToolDefinition {
    McpToolDefinition::new(
        name,
        description,
        json!({ "type": "object", "properties": {} }),
    )
}

fn connector() -> Arc<StaticConnector> {
    Arc::new(
        StaticConnector::new()
            .server("time", [
                tool("get_current_time", "Get current time in a timezone"),
                tool("convert_time", "Convert time between timezones"),
            ])
            .server("weather", [tool("get_forecast", "Weather forecast for a city")])
            .server("calculator", [
                tool("add", "Add two numbers"),
                tool("multiply", "Multiply two numbers"),
            ]),
    )
}

// =============================================================================
// Discovery
// =============================================================================

mod discovery_tests {
    use super::*;

    #[tokio::test]
    async fn test_discover_all_indexes_every_server() {
        init_tracing();
        let manager = McpManager::new(connector(), ToolSearchManager::default());

        let report = manager
            .discover_all([
                ("time".to_string(), McpServerConfig::stdio("time-server")),
                ("weather".to_string(), McpServerConfig::sse("https://weather.example/sse")),
                ("calculator".to_string(), McpServerConfig::stdio("calc")),
            ])
            .await;

        assert!(report.is_complete_success());
        assert_eq!(report.tools_indexed, 5);

        let hits = manager.search().search_by_relevance("forecast", None).await;
        assert_eq!(hits[0].qualified_name, "weather_get_forecast");

        let matches = manager
            .search()
            .search_by_pattern("^calculator_", None)
            .await
            .unwrap();
        let names: Vec<_> = matches.iter().map(|r| r.qualified_name.as_str()).collect();
        assert_eq!(names, ["calculator_add", "calculator_multiply"]);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_healthy_servers() {
        let manager = McpManager::new(connector(), ToolSearchManager::default());

        let report = manager
            .discover_all([
                ("time".to_string(), McpServerConfig::stdio("time-server")),
                ("offline".to_string(), McpServerConfig::stdio("missing")),
            ])
            .await;

        assert_eq!(report.connected, ["time"]);
        assert_eq!(report.failed[0].0, "offline");
        assert_eq!(manager.search().tool_count().await, 2);

        let state = manager.get_server_state("offline").await.unwrap();
        assert_eq!(state.status, McpConnectionStatus::Failed);
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let manager = McpManager::new(connector(), ToolSearchManager::default());
        let mut events = manager.subscribe();

        manager
            .add_server("calculator", McpServerConfig::stdio("calc"))
            .await
            .unwrap();
        manager.remove_server("calculator").await.unwrap();

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }

        assert_eq!(received, [
            CatalogEvent::ServerConnected {
                server: "calculator".into(),
                tool_count: 2,
            },
            CatalogEvent::ToolsIndexed {
                server: "calculator".into(),
                added: 2,
                total: 2,
            },
            CatalogEvent::ServerRemoved {
                server: "calculator".into(),
                removed: 2,
            },
        ]);
        assert!(received.iter().all(|e| e.server() == Some("calculator")));
    }

    #[tokio::test]
    async fn test_events_serialize_with_tag() {
        let event = CatalogEvent::ToolsIndexed {
            server: "time".into(),
            added: 2,
            total: 7,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "tools_indexed");
        assert_eq!(json["server"], "time");
    }

    #[tokio::test]
    async fn test_remove_server_drops_its_tools_only() {
        let manager = McpManager::new(connector(), ToolSearchManager::default());
        manager
            .discover_all([
                ("time".to_string(), McpServerConfig::stdio("time-server")),
                ("calculator".to_string(), McpServerConfig::stdio("calc")),
            ])
            .await;

        assert_eq!(manager.remove_server("time").await.unwrap(), 2);
        assert!(
            manager
                .search()
                .search_by_relevance("timezone", None)
                .await
                .is_empty()
        );
        assert_eq!(manager.search().tool_count().await, 2);
        assert!(manager.search().get_definition("time_get_current_time").is_none());
        assert!(manager.search().get_definition("calculator_add").is_some());
    }
}

// =============================================================================
// Custom Sources
// =============================================================================

mod source_tests {
    use super::*;

    /// Lists its tools only after being released, so a search can run while
    /// discovery is still pending.
    struct GatedSource {
        gate: Arc<Notify>,
        tools: Vec<McpToolDefinition>,
    }

    #[async_trait]
    impl ToolSource for GatedSource {
        async fn list_tools(&self) -> McpResult<Vec<McpToolDefinition>> {
            self.gate.notified().await;
            Ok(self.tools.clone())
        }
    }

    struct GatedConnector {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl SourceConnector for GatedConnector {
        async fn connect(
            &self,
            name: &str,
            _config: &McpServerConfig,
        ) -> McpResult<Arc<dyn ToolSource>> {
            if name == "refused" {
                return Err(McpError::ConnectionFailed {
                    message: "connection refused".into(),
                });
            }
            Ok(Arc::new(GatedSource {
                gate: self.gate.clone(),
                tools: vec![tool("deploy", "Deploy a service")],
            }))
        }
    }

    #[tokio::test]
    async fn test_search_before_source_responds() {
        let gate = Arc::new(Notify::new());
        let manager = Arc::new(McpManager::new(
            Arc::new(GatedConnector { gate: gate.clone() }),
            ToolSearchManager::default(),
        ));

        let pending = {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .add_server("ops", McpServerConfig::stdio("ops-server"))
                    .await
            })
        };

        tokio::task::yield_now().await;
        assert!(
            manager
                .search()
                .search_by_relevance("deploy", None)
                .await
                .is_empty()
        );

        gate.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), 1);
        let hits = manager.search().search_by_relevance("deploy", None).await;
        assert_eq!(hits[0].qualified_name, "ops_deploy");
    }

    #[tokio::test]
    async fn test_server_removed_while_listing_leaves_no_tools() {
        let gate = Arc::new(Notify::new());
        let manager = Arc::new(McpManager::new(
            Arc::new(GatedConnector { gate: gate.clone() }),
            ToolSearchManager::default(),
        ));

        let pending = {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .add_server("ops", McpServerConfig::stdio("ops-server"))
                    .await
            })
        };
        tokio::task::yield_now().await;

        assert_eq!(manager.remove_server("ops").await.unwrap(), 0);
        gate.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), 0);

        assert!(manager.list_servers().await.is_empty());
        assert_eq!(manager.search().tool_count().await, 0);
        assert!(
            manager
                .search()
                .search_by_relevance("deploy", None)
                .await
                .is_empty()
        );
        assert!(manager.search().get_definition("ops_deploy").is_none());

        // The name is free again and indexes normally.
        gate.notify_one();
        assert_eq!(
            manager
                .add_server("ops", McpServerConfig::stdio("ops-server"))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_connector_failure_is_counted() {
        let metrics = Arc::new(MetricsRegistry::new());
        let search = ToolSearchManager::with_metrics(ToolSearchConfig::default(), metrics.clone());
        let manager = McpManager::new(
            Arc::new(GatedConnector {
                gate: Arc::new(Notify::new()),
            }),
            search,
        );

        let err = manager
            .add_server("refused", McpServerConfig::stdio("nope"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(metrics.discovery_failures.get(), 1);
    }
}

// =============================================================================
// Settings
// =============================================================================

mod settings_tests {
    use super::*;

    #[tokio::test]
    async fn test_settings_file_drives_discovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.json");
        tokio::fs::write(
            &path,
            r#"{
                "mcpServers": {
                    "time": { "type": "stdio", "command": "time-server" },
                    "weather": { "type": "sse", "url": "https://weather.example/sse" }
                },
                "toolSearch": { "defaultLimit": 1, "chunkSize": 1 }
            }"#,
        )
        .await
        .unwrap();

        let settings = Settings::load(&path).await.unwrap();
        assert_eq!(settings.tool_search.default_limit, 1);

        let manager = McpManager::new(
            connector(),
            ToolSearchManager::new(settings.tool_search.clone()),
        );
        let report = manager.discover_all(settings.mcp_servers).await;
        assert_eq!(report.connected, ["time", "weather"]);
        assert_eq!(
            manager.search().search_by_relevance("time", None).await.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_provider_overrides() {
        let provider = MemoryConfigProvider::new()
            .value("tool_search.default_limit", "3")
            .value("tool_search.mode", "regex")
            .value("tool_search.pattern_search", "true");

        let config = ToolSearchConfig::from_provider(&provider).await.unwrap();
        assert_eq!(config.default_limit, 3);
        assert_eq!(config.search_mode, SearchMode::Regex);

        let manager = ToolSearchManager::new(config);
        manager
            .add_tools("time", [tool("get_current_time", "Current time")])
            .await;
        let hits = manager.search("^time_").await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.json");
        tokio::fs::write(&path, r#"{ "toolSearch": { "maxLimit": 0 } }"#)
            .await
            .unwrap();

        assert!(Settings::load(&path).await.is_err());
    }
}
