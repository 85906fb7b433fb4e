//! Atomic metrics for search and indexing.
//!
//! The registry is created by the host and shared by `Arc`; nothing here is
//! global.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Thread-safe atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Thread-safe atomic gauge.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Simple histogram using fixed buckets.
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<AtomicU64>,
    bucket_bounds: Vec<f64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new(bucket_bounds: Vec<f64>) -> Self {
        let buckets = (0..=bucket_bounds.len())
            .map(|_| AtomicU64::new(0))
            .collect();
        Self {
            buckets,
            bucket_bounds,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Buckets in microseconds, sized for in-memory lookups.
    pub fn default_micros() -> Self {
        Self::new(vec![
            10.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 5_000.0, 25_000.0, 100_000.0,
        ])
    }

    pub fn observe(&self, value: f64) {
        let bucket_idx = self
            .bucket_bounds
            .iter()
            .position(|&bound| value <= bound)
            .unwrap_or(self.bucket_bounds.len());

        self.buckets[bucket_idx].fetch_add(1, Ordering::Relaxed);
        self.sum
            .fetch_add((value * 1000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_duration(&self, elapsed: Duration) {
        self.observe(elapsed.as_secs_f64() * 1_000_000.0);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Number of observations that fell into bucket `idx`; the last bucket
    /// collects everything above the largest bound.
    pub fn bucket_count(&self, idx: usize) -> u64 {
        self.buckets
            .get(idx)
            .map(|b| b.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Sum in the observed unit. Stored scaled by 1000x internally.
    pub fn sum(&self) -> f64 {
        self.sum.load(Ordering::Relaxed) as f64 / 1000.0
    }

    pub fn mean(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.sum() / n as f64,
        }
    }
}

#[derive(Debug)]
pub struct MetricsRegistry {
    pub relevance_searches: Counter,
    pub pattern_searches: Counter,
    pub pattern_errors: Counter,
    pub empty_results: Counter,
    pub tools_indexed: Counter,
    pub tools_removed: Counter,
    pub indexed_tools: Gauge,
    pub discovery_failures: Counter,
    pub search_latency_us: Histogram,
    pub index_latency_us: Histogram,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            relevance_searches: Counter::new(),
            pattern_searches: Counter::new(),
            pattern_errors: Counter::new(),
            empty_results: Counter::new(),
            tools_indexed: Counter::new(),
            tools_removed: Counter::new(),
            indexed_tools: Gauge::new(),
            discovery_failures: Counter::new(),
            search_latency_us: Histogram::default_micros(),
            index_latency_us: Histogram::default_micros(),
        }
    }

    pub fn record_relevance_search(&self, hits: usize, elapsed: Duration) {
        self.relevance_searches.inc();
        self.record_hits(hits, elapsed);
    }

    /// `hits` is `None` when the pattern was rejected.
    pub fn record_pattern_search(&self, hits: Option<usize>, elapsed: Duration) {
        self.pattern_searches.inc();
        match hits {
            Some(hits) => self.record_hits(hits, elapsed),
            None => self.pattern_errors.inc(),
        }
    }

    fn record_hits(&self, hits: usize, elapsed: Duration) {
        if hits == 0 {
            self.empty_results.inc();
        }
        self.search_latency_us.observe_duration(elapsed);
    }

    pub fn record_indexed(&self, added: usize, total: usize, elapsed: Duration) {
        self.tools_indexed.add(added as u64);
        self.indexed_tools.set(total as i64);
        self.index_latency_us.observe_duration(elapsed);
    }

    pub fn record_removed(&self, removed: usize, total: usize) {
        self.tools_removed.add(removed as u64);
        self.indexed_tools.set(total as i64);
    }

    pub fn record_discovery_failure(&self) {
        self.discovery_failures.inc();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a [`MetricsRegistry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSummary {
    pub relevance_searches: u64,
    pub pattern_searches: u64,
    pub pattern_errors: u64,
    pub empty_results: u64,
    pub tools_indexed: u64,
    pub tools_removed: u64,
    pub indexed_tools: i64,
    pub discovery_failures: u64,
    pub avg_search_latency_us: f64,
    pub avg_index_latency_us: f64,
}

impl MetricsSummary {
    pub fn from_registry(registry: &MetricsRegistry) -> Self {
        Self {
            relevance_searches: registry.relevance_searches.get(),
            pattern_searches: registry.pattern_searches.get(),
            pattern_errors: registry.pattern_errors.get(),
            empty_results: registry.empty_results.get(),
            tools_indexed: registry.tools_indexed.get(),
            tools_removed: registry.tools_removed.get(),
            indexed_tools: registry.indexed_tools.get(),
            discovery_failures: registry.discovery_failures.get(),
            avg_search_latency_us: registry.search_latency_us.mean(),
            avg_index_latency_us: registry.index_latency_us.mean(),
        }
    }
}
