//! Metrics and tracing spans for the search core.
//!
//! ```rust
//! use std::sync::Arc;
//! use tool_discovery::{MetricsRegistry, ToolSearchManager, config::ToolSearchConfig};
//!
//! let metrics = Arc::new(MetricsRegistry::new());
//! let manager = ToolSearchManager::with_metrics(ToolSearchConfig::default(), metrics.clone());
//! # let _ = manager;
//! ```

mod metrics;
mod spans;

pub use metrics::{Counter, Gauge, Histogram, MetricsRegistry, MetricsSummary};
pub use spans::{index_span, search_span};
