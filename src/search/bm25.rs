//! Incrementally maintained BM25 index over catalog entries.
//!
//! The index keeps per-document token sequences, a term -> document-frequency
//! map and the aggregate counters needed for length normalization. Entries
//! can be added one at a time, in batches, or in chunks that yield to the
//! scheduler between chunks; all three paths end in the same state.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use tracing::{debug, trace};

use super::entry::CatalogEntry;
use super::result::SearchResult;
use super::tokenizer::tokenize;

pub const DEFAULT_K1: f64 = 1.2;
pub const DEFAULT_B: f64 = 0.75;

/// Scores closer than this are treated as tied and ordered by identifier.
pub const TIE_EPSILON: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Document-length normalization strength.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
        }
    }
}

#[derive(Debug, Clone)]
struct Document {
    tokens: Vec<String>,
    entry: Arc<CatalogEntry>,
}

impl Document {
    fn term_frequency(&self, term: &str) -> usize {
        self.tokens.iter().filter(|t| t.as_str() == term).count()
    }

    fn unique_terms(&self) -> AHashSet<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }
}

/// Aggregate counters, exposed for diagnostics and equality checks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndexStats {
    pub documents: usize,
    pub total_tokens: usize,
    pub avg_doc_len: f64,
    pub unique_terms: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    params: Bm25Params,
    documents: AHashMap<String, Document>,
    doc_freq: AHashMap<String, usize>,
    doc_lengths: AHashMap<String, usize>,
    total_tokens: usize,
    avg_doc_len: f64,
    estimated_tokens: usize,
}

impl Bm25Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: Bm25Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.documents.contains_key(qualified_name)
    }

    pub fn get(&self, qualified_name: &str) -> Option<&Arc<CatalogEntry>> {
        self.documents.get(qualified_name).map(|doc| &doc.entry)
    }

    /// Snapshot of every indexed entry, sorted by identifier.
    pub fn entries(&self) -> Vec<Arc<CatalogEntry>> {
        let mut entries: Vec<Arc<CatalogEntry>> =
            self.documents.values().map(|d| d.entry.clone()).collect();
        entries.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        entries
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    /// Document frequencies in term order.
    pub fn term_stats(&self) -> BTreeMap<&str, usize> {
        self.doc_freq
            .iter()
            .map(|(term, freq)| (term.as_str(), *freq))
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.documents.len(),
            total_tokens: self.total_tokens,
            avg_doc_len: self.avg_doc_len,
            unique_terms: self.doc_freq.len(),
        }
    }

    /// Sum of the schema-size estimates of all indexed tools.
    pub fn estimated_tokens(&self) -> usize {
        self.estimated_tokens
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.doc_freq.clear();
        self.doc_lengths.clear();
        self.total_tokens = 0;
        self.avg_doc_len = 0.0;
        self.estimated_tokens = 0;
    }

    /// Replaces the whole index with `entries`.
    pub fn index_tools<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Arc<CatalogEntry>>,
    {
        self.clear();
        let added = self.add_tools_batch(entries);
        debug!(documents = self.len(), "Rebuilt tool index");
        added
    }

    /// Adds one entry. Returns `false` if its identifier is already indexed;
    /// the existing document is kept as-is.
    pub fn add_tool(&mut self, entry: impl Into<Arc<CatalogEntry>>) -> bool {
        let added = self.insert(entry.into());
        if added {
            self.recompute_average();
        }
        added
    }

    /// Adds entries in order, recomputing the average length once.
    pub fn add_tools_batch<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Arc<CatalogEntry>>,
    {
        let mut added = 0;
        for entry in entries {
            if self.insert(entry.into()) {
                added += 1;
            }
        }
        self.recompute_average();
        added
    }

    /// Adds entries `chunk_size` at a time, yielding to the scheduler between
    /// chunks. The final state matches [`Self::add_tools_batch`] for any
    /// chunk size. A chunk size of zero is treated as one.
    pub async fn add_tools_async<I>(&mut self, entries: I, chunk_size: usize) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Arc<CatalogEntry>>,
    {
        let chunk_size = chunk_size.max(1);
        let mut pending = entries.into_iter().peekable();
        let mut added = 0;

        loop {
            for entry in pending.by_ref().take(chunk_size) {
                if self.insert(entry.into()) {
                    added += 1;
                }
            }
            self.recompute_average();
            trace!(documents = self.len(), "Indexed chunk");

            if pending.peek().is_none() {
                break;
            }
            tokio::task::yield_now().await;
        }

        added
    }

    /// Clears the index, then performs a chunked add.
    pub async fn index_tools_async<I>(&mut self, entries: I, chunk_size: usize) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Arc<CatalogEntry>>,
    {
        self.clear();
        let added = self.add_tools_async(entries, chunk_size).await;
        debug!(documents = self.len(), chunk_size, "Rebuilt tool index in chunks");
        added
    }

    pub fn remove_tool(&mut self, qualified_name: &str) -> bool {
        let Some(doc) = self.documents.remove(qualified_name) else {
            return false;
        };

        for term in doc.unique_terms() {
            match self.doc_freq.get_mut(term) {
                Some(freq) if *freq > 1 => *freq -= 1,
                Some(_) => {
                    self.doc_freq.remove(term);
                }
                None => {}
            }
        }

        let length = self.doc_lengths.remove(qualified_name).unwrap_or(0);
        self.total_tokens -= length;
        self.estimated_tokens -= doc.entry.estimated_tokens;
        self.recompute_average();
        debug!(tool = qualified_name, "Removed tool from index");
        true
    }

    /// Ranks documents against `query` and returns at most `limit` results
    /// with a strictly positive score.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || self.documents.is_empty() {
            return Vec::new();
        }

        let n = self.documents.len() as f64;
        let weighted: Vec<(&str, f64)> = query_terms
            .iter()
            .filter_map(|term| {
                let df = self.document_frequency(term);
                (df > 0).then(|| (term.as_str(), idf(n, df as f64)))
            })
            .collect();
        if weighted.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &Arc<CatalogEntry>)> = self
            .documents
            .values()
            .filter_map(|doc| {
                let score = self.score(doc, &weighted);
                (score > 0.0).then_some((score, &doc.entry))
            })
            .collect();

        order_by_score(&mut scored);
        scored
            .into_iter()
            .take(limit)
            .map(|(score, entry)| SearchResult::from_entry(entry, score))
            .collect()
    }

    fn score(&self, doc: &Document, weighted: &[(&str, f64)]) -> f64 {
        let Bm25Params { k1, b } = self.params;
        let doc_len = doc.tokens.len() as f64;

        weighted
            .iter()
            .map(|(term, idf)| {
                let tf = doc.term_frequency(term) as f64;
                if tf == 0.0 {
                    return 0.0;
                }
                let numerator = tf * (k1 + 1.0);
                let denominator = tf + k1 * (1.0 - b + b * (doc_len / self.avg_doc_len));
                idf * numerator / denominator
            })
            .sum()
    }

    fn insert(&mut self, entry: Arc<CatalogEntry>) -> bool {
        if self.documents.contains_key(&entry.qualified_name) {
            trace!(tool = %entry.qualified_name, "Skipping already indexed tool");
            return false;
        }

        let tokens = tokenize(&entry.searchable_text);
        let doc = Document { tokens, entry };
        for term in doc.unique_terms() {
            *self.doc_freq.entry(term.to_string()).or_insert(0) += 1;
        }

        let key = doc.entry.qualified_name.clone();
        self.total_tokens += doc.tokens.len();
        self.estimated_tokens += doc.entry.estimated_tokens;
        self.doc_lengths.insert(key.clone(), doc.tokens.len());
        self.documents.insert(key, doc);
        true
    }

    fn recompute_average(&mut self) {
        self.avg_doc_len = if self.documents.is_empty() {
            0.0
        } else {
            self.total_tokens as f64 / self.documents.len() as f64
        };
    }
}

/// `ln((N - df + 0.5) / (df + 0.5) + 1)`; the `+ 1` keeps it non-negative.
fn idf(n: f64, df: f64) -> f64 {
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Descending by score; scores within [`TIE_EPSILON`] of a group's highest
/// score are ordered by ascending identifier. A document never ranks below
/// one that scores at least [`TIE_EPSILON`] lower.
fn order_by_score(scored: &mut [(f64, &Arc<CatalogEntry>)]) {
    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.qualified_name.cmp(&b.1.qualified_name))
    });

    let mut start = 0;
    for i in 1..=scored.len() {
        if i == scored.len() || scored[start].0 - scored[i].0 >= TIE_EPSILON {
            scored[start..i].sort_by(|a, b| a.1.qualified_name.cmp(&b.1.qualified_name));
            start = i;
        }
    }
}
