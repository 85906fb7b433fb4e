//! Tool search manager: the lock-owning front of the index.
//!
//! A single writer at a time mutates the [`Bm25Index`]; readers share it.
//! Chunked adds take the write lock per chunk and release it before yielding,
//! so a search issued mid-way sees every tool indexed so far.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{Instrument, debug, info, warn};

use super::bm25::{Bm25Index, IndexStats};
use super::entry::CatalogEntry;
use super::error::{SearchError, SearchResultSet};
use super::mode::SearchMode;
use super::pattern::search_with_regex;
use super::result::SearchResult;
use crate::config::ToolSearchConfig;
use crate::mcp::{McpToolDefinition, ToolDefinition};
use crate::observability::{MetricsRegistry, index_span, search_span};

#[derive(Clone)]
pub struct ToolSearchManager {
    config: ToolSearchConfig,
    index: Arc<RwLock<Bm25Index>>,
    definitions: Arc<DashMap<String, McpToolDefinition>>,
    metrics: Arc<MetricsRegistry>,
}

impl ToolSearchManager {
    pub fn new(config: ToolSearchConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(config: ToolSearchConfig, metrics: Arc<MetricsRegistry>) -> Self {
        let index = Bm25Index::with_params(config.bm25_params());
        Self {
            config,
            index: Arc::new(RwLock::new(index)),
            definitions: Arc::new(DashMap::new()),
            metrics,
        }
    }

    pub fn config(&self) -> &ToolSearchConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Replaces the catalog with `tools` (origin, definition), indexing in
    /// chunks. Searches issued during the rebuild see the partial catalog.
    pub async fn build_index<I>(&self, tools: I) -> usize
    where
        I: IntoIterator<Item = (String, McpToolDefinition)>,
    {
        let entries: Vec<(CatalogEntry, McpToolDefinition)> = tools
            .into_iter()
            .map(|(origin, tool)| (CatalogEntry::from_mcp_tool(&origin, &tool), tool))
            .collect();

        {
            let mut index = self.index.write().await;
            index.clear();
            self.definitions.clear();
        }
        self.index_chunked("*", entries).await
    }

    /// Adds one tool. Returns `false` if its identifier is already indexed.
    pub async fn add_tool(&self, origin: &str, tool: McpToolDefinition) -> bool {
        let start = Instant::now();
        let entry = CatalogEntry::from_mcp_tool(origin, &tool);
        let mut index = self.index.write().await;
        if !self.admit(&index, &entry, tool) {
            return false;
        }
        let added = index.add_tool(entry);
        self.metrics
            .record_indexed(usize::from(added), index.len(), start.elapsed());
        added
    }

    /// Adds every tool from `origin` under one write lock.
    pub async fn add_tools<I>(&self, origin: &str, tools: I) -> usize
    where
        I: IntoIterator<Item = McpToolDefinition>,
    {
        let start = Instant::now();
        let mut index = self.index.write().await;
        let accepted: Vec<CatalogEntry> = tools
            .into_iter()
            .filter_map(|tool| {
                let entry = CatalogEntry::from_mcp_tool(origin, &tool);
                self.admit(&index, &entry, tool).then_some(entry)
            })
            .collect();
        let added = index.add_tools_batch(accepted);
        self.metrics
            .record_indexed(added, index.len(), start.elapsed());
        added
    }

    /// Adds every tool from `origin` in chunks of `config.chunk_size`,
    /// yielding between chunks.
    pub async fn add_tools_async(&self, origin: &str, tools: Vec<McpToolDefinition>) -> usize {
        let entries = tools
            .into_iter()
            .map(|tool| (CatalogEntry::from_mcp_tool(origin, &tool), tool))
            .collect();
        self.index_chunked(origin, entries).await
    }

    async fn index_chunked(
        &self,
        origin: &str,
        entries: Vec<(CatalogEntry, McpToolDefinition)>,
    ) -> usize {
        let chunk_size = self.config.chunk_size.max(1);
        let span = index_span(origin, entries.len(), chunk_size);

        async move {
            let start = Instant::now();
            let mut pending = entries.into_iter().peekable();
            let mut added = 0;
            let mut total;

            loop {
                {
                    let mut index = self.index.write().await;
                    let mut accepted = Vec::with_capacity(chunk_size);
                    for (entry, tool) in pending.by_ref().take(chunk_size) {
                        if self.admit(&index, &entry, tool) {
                            accepted.push(entry);
                        }
                    }
                    added += index.add_tools_batch(accepted);
                    total = index.len();
                }

                if pending.peek().is_none() {
                    break;
                }
                tokio::task::yield_now().await;
            }

            self.metrics.record_indexed(added, total, start.elapsed());
            info!(added, total, "Indexed tools");
            added
        }
        .instrument(span)
        .await
    }

    /// Records the raw definition for a tool about to be indexed. Returns
    /// `false` when the identifier is already taken.
    fn admit(&self, index: &Bm25Index, entry: &CatalogEntry, tool: McpToolDefinition) -> bool {
        if let Some(existing) = index.get(&entry.qualified_name) {
            if existing.id != entry.id {
                warn!(
                    tool = %entry.qualified_name,
                    existing_origin = %existing.origin(),
                    origin = %entry.origin(),
                    "Tool identifier collides with a tool from another origin; keeping the first"
                );
            }
            return false;
        }
        self.definitions
            .entry(entry.qualified_name.clone())
            .or_insert(tool);
        true
    }

    pub async fn remove_tool(&self, qualified_name: &str) -> bool {
        let mut index = self.index.write().await;
        let removed = index.remove_tool(qualified_name);
        if removed {
            self.definitions.remove(qualified_name);
            self.metrics.record_removed(1, index.len());
        }
        removed
    }

    /// Removes every tool that came from `origin`.
    pub async fn remove_server(&self, origin: &str) -> usize {
        let mut index = self.index.write().await;
        let names: Vec<String> = index
            .entries()
            .into_iter()
            .filter(|e| e.origin() == origin)
            .map(|e| e.qualified_name.clone())
            .collect();

        for name in &names {
            index.remove_tool(name);
            self.definitions.remove(name);
        }
        self.metrics.record_removed(names.len(), index.len());
        debug!(origin, removed = names.len(), "Removed tools for origin");
        names.len()
    }

    /// BM25 search. `None` uses the configured default limit.
    pub async fn search_by_relevance(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Vec<SearchResult> {
        let limit = self.config.resolve_limit(limit);
        let span = search_span(SearchMode::Bm25, query, limit);

        async move {
            let start = Instant::now();
            let results = self.index.read().await.search(query, limit);
            self.metrics
                .record_relevance_search(results.len(), start.elapsed());
            debug!(hits = results.len(), "Relevance search");
            results
        }
        .instrument(span)
        .await
    }

    /// Regex search over a snapshot of the catalog. The index lock is not
    /// held while matching.
    pub async fn search_by_pattern(
        &self,
        pattern: &str,
        limit: Option<usize>,
    ) -> SearchResultSet<Vec<SearchResult>> {
        if !self.config.pattern_search_enabled {
            return Err(SearchError::Unavailable {
                message: "pattern search is disabled; use a relevance query".to_string(),
            });
        }

        let limit = self.config.resolve_limit(limit);
        let span = search_span(SearchMode::Regex, pattern, limit);

        async move {
            let start = Instant::now();
            let snapshot = self.index.read().await.entries();
            let outcome = search_with_regex(snapshot, pattern, limit);
            match &outcome {
                Ok(hits) => {
                    self.metrics
                        .record_pattern_search(Some(hits.len()), start.elapsed());
                }
                Err(e) => {
                    debug!(code = e.code().as_str(), error = %e, "Rejected search pattern");
                    self.metrics.record_pattern_search(None, start.elapsed());
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Searches with the configured mode and default limit.
    pub async fn search(&self, query: &str) -> SearchResultSet<Vec<SearchResult>> {
        match self.config.search_mode {
            SearchMode::Bm25 => Ok(self.search_by_relevance(query, None).await),
            SearchMode::Regex => self.search_by_pattern(query, None).await,
        }
    }

    pub async fn get_entry(&self, qualified_name: &str) -> Option<Arc<CatalogEntry>> {
        self.index.read().await.get(qualified_name).cloned()
    }

    pub fn get_definition(&self, qualified_name: &str) -> Option<ToolDefinition> {
        self.definitions
            .get(qualified_name)
            .map(|def| ToolDefinition::from_mcp(qualified_name, def.value()))
    }

    pub fn get_definitions(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.get_definition(name))
            .collect()
    }

    /// Identifiers currently indexed for `origin`, sorted.
    pub async fn origin_tools(&self, origin: &str) -> Vec<String> {
        self.index
            .read()
            .await
            .entries()
            .into_iter()
            .filter(|e| e.origin() == origin)
            .map(|e| e.qualified_name.clone())
            .collect()
    }

    pub async fn tool_count(&self) -> usize {
        self.index.read().await.len()
    }

    /// Estimated prompt tokens if every schema were loaded up front.
    pub async fn total_tokens(&self) -> usize {
        self.index.read().await.estimated_tokens()
    }

    pub async fn stats(&self) -> IndexStats {
        self.index.read().await.stats()
    }

    pub async fn should_use_search(&self) -> bool {
        self.total_tokens().await > self.config.threshold_tokens()
    }

    /// Splits the catalog into tools sent up front and tools left behind
    /// search.
    pub async fn prepare_tools(&self) -> PreparedTools {
        let index = self.index.read().await;
        let total_tokens = index.estimated_tokens();
        let use_search = total_tokens > self.config.threshold_tokens();
        let mut immediate = Vec::new();
        let mut deferred = Vec::new();

        for entry in index.entries() {
            let Some(def) = self.get_definition(&entry.qualified_name) else {
                continue;
            };

            let always_load = self.config.always_load.contains(&entry.qualified_name)
                || self.config.always_load.iter().any(|n| n == entry.local_name());

            if use_search && !always_load {
                deferred.push(def.deferred());
            } else {
                immediate.push(def);
            }
        }

        PreparedTools {
            use_search,
            search_mode: self.config.search_mode,
            immediate,
            deferred,
            total_tokens,
            threshold_tokens: self.config.threshold_tokens(),
        }
    }
}

impl Default for ToolSearchManager {
    fn default() -> Self {
        Self::new(ToolSearchConfig::default())
    }
}

#[derive(Debug)]
pub struct PreparedTools {
    pub use_search: bool,
    pub search_mode: SearchMode,
    pub immediate: Vec<ToolDefinition>,
    pub deferred: Vec<ToolDefinition>,
    pub total_tokens: usize,
    pub threshold_tokens: usize,
}

impl PreparedTools {
    pub fn all_tools(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.immediate.iter().chain(self.deferred.iter())
    }

    pub fn token_savings(&self) -> usize {
        if self.use_search {
            self.deferred
                .iter()
                .map(|t| t.estimated_tokens())
                .sum::<usize>()
        } else {
            0
        }
    }
}
