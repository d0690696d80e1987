//! Core traits defining the interfaces between components.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::{RecallHit, RecallRequest};

/// A pluggable retrieval strategy.
///
/// Given a query, a source returns a bounded list of scored hits. The
/// dispatcher fans a request out to every enabled source concurrently and
/// does not trust any of them to respect the shared deadline; each call is
/// additionally bounded by a `tokio::time::timeout`.
///
/// Output contract for all implementations:
/// - scores and confidences in [0, 1]
/// - hits sorted best-first
/// - at most `request.top_k` hits returned
///
/// Returning an empty list on an internal failure is an acceptable inner
/// fallback; returning `Err` lets the dispatcher's retry re-trigger the
/// call.
#[async_trait]
pub trait RecallSource: Send + Sync {
    /// Stable identifier used for weighting, provenance, and telemetry.
    fn source_name(&self) -> &str;

    /// Retrieve candidate hits for the request.
    async fn acquire(&self, request: &RecallRequest) -> Result<Vec<RecallHit>>;
}

/// Embedding model seam for the vector source.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// A match returned by a vector index lookup.
#[derive(Debug, Clone)]
pub struct IndexMatch {
    /// Stable identifier of the indexed entry.
    pub id: String,

    /// Similarity score (higher is better).
    pub score: f32,

    /// The indexed content text.
    pub content: String,

    /// Entry metadata (title, url, category, ...).
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Vector index seam for the vector source.
///
/// How the index stores and searches embeddings is out of scope; the
/// source only consumes ranked matches.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `k` nearest entries to the embedding, best-first.
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexMatch>>;
}
