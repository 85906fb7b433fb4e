//! Search index tuning and caller-facing limits.

use serde::{Deserialize, Serialize};

use super::provider::{ConfigProvider, ConfigProviderExt};
use super::{ConfigError, ConfigResult, ValidationErrors};
use crate::search::{Bm25Params, DEFAULT_B, DEFAULT_K1, SearchMode};

const KEY_PREFIX: &str = "tool_search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSearchConfig {
    /// Results returned when the caller gives no limit.
    pub default_limit: usize,
    /// Upper bound applied to caller-supplied limits.
    pub max_limit: usize,
    /// Entries indexed per step of a chunked add.
    pub chunk_size: usize,
    pub search_mode: SearchMode,
    pub pattern_search_enabled: bool,
    pub k1: f64,
    pub b: f64,
    /// Fraction of the context window that tool schemas may occupy before
    /// they are deferred behind search.
    pub threshold: f64,
    pub context_window: usize,
    pub always_load: Vec<String>,
}

impl Default for ToolSearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 50,
            chunk_size: 50,
            search_mode: SearchMode::Bm25,
            pattern_search_enabled: true,
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            threshold: 0.10,
            context_window: 200_000,
            always_load: Vec::new(),
        }
    }
}

impl ToolSearchConfig {
    pub fn threshold_tokens(&self) -> usize {
        (self.context_window as f64 * self.threshold) as usize
    }

    pub fn bm25_params(&self) -> Bm25Params {
        Bm25Params {
            k1: self.k1,
            b: self.b,
        }
    }

    /// `None` means the default limit; explicit limits are clamped into
    /// `1..=max_limit`.
    pub fn resolve_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            None => self.default_limit,
            Some(n) => n.clamp(1, self.max_limit.max(1)),
        }
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_max_limit(mut self, limit: usize) -> Self {
        self.max_limit = limit;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    pub fn with_pattern_search(mut self, enabled: bool) -> Self {
        self.pattern_search_enabled = enabled;
        self
    }

    pub fn with_bm25_params(mut self, params: Bm25Params) -> Self {
        self.k1 = params.k1;
        self.b = params.b;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_context_window(mut self, tokens: usize) -> Self {
        self.context_window = tokens;
        self
    }

    pub fn with_always_load(mut self, tools: Vec<String>) -> Self {
        self.always_load = tools;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.default_limit == 0 {
            errors.push(ConfigError::invalid("default_limit", "must be at least 1"));
        }
        if self.max_limit < self.default_limit {
            errors.push(ConfigError::invalid(
                "max_limit",
                format!("must be >= default_limit ({})", self.default_limit),
            ));
        }
        if self.chunk_size == 0 {
            errors.push(ConfigError::invalid("chunk_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            errors.push(ConfigError::invalid("threshold", "must be within 0.0..=1.0"));
        }
        if !self.k1.is_finite() || self.k1 < 0.0 {
            errors.push(ConfigError::invalid("k1", "must be a non-negative number"));
        }
        if !(0.0..=1.0).contains(&self.b) {
            errors.push(ConfigError::invalid("b", "must be within 0.0..=1.0"));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::ValidationErrors(ValidationErrors(errors))),
        }
    }

    /// Reads `tool_search.*` keys from `provider` on top of the defaults.
    pub async fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> ConfigResult<Self> {
        Self::from_provider_with(Self::default(), provider).await
    }

    /// Reads `tool_search.*` keys from `provider` on top of `base`.
    pub async fn from_provider_with<P: ConfigProvider + ?Sized>(
        base: Self,
        provider: &P,
    ) -> ConfigResult<Self> {
        let mut config = base;
        let key = |name: &str| format!("{}.{}", KEY_PREFIX, name);

        if let Some(v) = provider.get::<usize>(&key("default_limit")).await? {
            config.default_limit = v;
        }
        if let Some(v) = provider.get::<usize>(&key("max_limit")).await? {
            config.max_limit = v;
        }
        if let Some(v) = provider.get::<usize>(&key("chunk_size")).await? {
            config.chunk_size = v;
        }
        if let Some(v) = provider.get_parsed::<SearchMode>(&key("mode")).await? {
            config.search_mode = v;
        }
        if let Some(v) = provider.get::<bool>(&key("pattern_search")).await? {
            config.pattern_search_enabled = v;
        }
        if let Some(v) = provider.get::<f64>(&key("threshold")).await? {
            config.threshold = v;
        }
        if let Some(v) = provider.get::<usize>(&key("context_window")).await? {
            config.context_window = v;
        }

        tracing::debug!(source = provider.name(), "Loaded tool search config");
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigProvider;

    #[test]
    fn test_config_threshold_tokens() {
        let config = ToolSearchConfig::default();
        assert_eq!(config.threshold_tokens(), 20_000); // 10% of 200k
    }

    #[test]
    fn test_config_builder() {
        let config = ToolSearchConfig::default()
            .with_threshold(0.05)
            .with_context_window(100_000)
            .with_search_mode(SearchMode::Regex)
            .with_chunk_size(10);

        assert_eq!(config.threshold, 0.05);
        assert_eq!(config.search_mode, SearchMode::Regex);
        assert_eq!(config.threshold_tokens(), 5_000);
        assert_eq!(config.chunk_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_bm25_params() {
        let params = ToolSearchConfig::default().bm25_params();
        assert_eq!(params, Bm25Params::default());
        assert_eq!(params.k1, 1.2);
        assert_eq!(params.b, 0.75);
    }

    #[test]
    fn test_resolve_limit() {
        let config = ToolSearchConfig::default();
        assert_eq!(config.resolve_limit(None), 5);
        assert_eq!(config.resolve_limit(Some(0)), 1);
        assert_eq!(config.resolve_limit(Some(12)), 12);
        assert_eq!(config.resolve_limit(Some(1_000)), 50);
    }

    #[test]
    fn test_validate_collects_errors() {
        let config = ToolSearchConfig::default()
            .with_chunk_size(0)
            .with_default_limit(0);
        match config.validate() {
            Err(ConfigError::ValidationErrors(errors)) => assert_eq!(errors.0.len(), 2),
            other => panic!("unexpected: {other:?}"),
        }

        let single = ToolSearchConfig {
            b: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            single.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "b"
        ));
    }

    #[test]
    fn test_serde_camel_case_with_defaults() {
        let config: ToolSearchConfig =
            serde_json::from_str(r#"{"defaultLimit": 8, "searchMode": "regex"}"#).unwrap();
        assert_eq!(config.default_limit, 8);
        assert_eq!(config.search_mode, SearchMode::Regex);
        assert_eq!(config.chunk_size, 50);
    }

    #[tokio::test]
    async fn test_from_provider() {
        let provider = MemoryConfigProvider::new()
            .value("tool_search.default_limit", "7")
            .value("tool_search.chunk_size", "3")
            .value("tool_search.mode", "regex")
            .value("tool_search.pattern_search", "false");

        let config = ToolSearchConfig::from_provider(&provider).await.unwrap();
        assert_eq!(config.default_limit, 7);
        assert_eq!(config.chunk_size, 3);
        assert_eq!(config.search_mode, SearchMode::Regex);
        assert!(!config.pattern_search_enabled);
        assert_eq!(config.max_limit, 50);
    }

    #[tokio::test]
    async fn test_from_provider_rejects_bad_values() {
        let provider = MemoryConfigProvider::new().value("tool_search.mode", "fuzzy");
        assert!(ToolSearchConfig::from_provider(&provider).await.is_err());

        let provider = MemoryConfigProvider::new().value("tool_search.chunk_size", "0");
        assert!(ToolSearchConfig::from_provider(&provider).await.is_err());
    }
}
