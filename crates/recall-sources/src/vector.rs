//! Vector-similarity retrieval source.
//!
//! Embeds the query and looks it up in a vector index. Both seams are
//! traits so the index backend and embedding model stay out of scope;
//! similarity scores pass through as both score and confidence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use recall_core::{Embedder, RecallHit, RecallRequest, RecallSource, Result, VectorIndex};

/// Default cap on query length fed to the embedder.
const DEFAULT_MAX_QUERY_CHARS: usize = 2048;

/// Vector-similarity retrieval source.
pub struct VectorSource<E, I> {
    embedder: Arc<E>,
    index: Arc<I>,
    max_query_chars: usize,
}

impl<E, I> VectorSource<E, I>
where
    E: Embedder,
    I: VectorIndex,
{
    /// Create a source over an embedder and an index.
    pub fn new(embedder: Arc<E>, index: Arc<I>) -> Self {
        Self {
            embedder,
            index,
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
        }
    }

    /// Override the query length cap applied before embedding.
    pub fn with_max_query_chars(mut self, max_query_chars: usize) -> Self {
        self.max_query_chars = max_query_chars;
        self
    }
}

#[async_trait]
impl<E, I> RecallSource for VectorSource<E, I>
where
    E: Embedder,
    I: VectorIndex,
{
    fn source_name(&self) -> &str {
        "vector"
    }

    async fn acquire(&self, request: &RecallRequest) -> Result<Vec<RecallHit>> {
        // Bound the query so it never exceeds the embedding model's input
        let query: String = request.query.chars().take(self.max_query_chars).collect();
        if query.len() < request.query.len() {
            warn!(
                "Vector recall: query truncated from {} to {} chars before embedding",
                request.query.len(),
                query.len()
            );
        }

        let embedding = self.embedder.embed_query(&query).await?;
        let matches = self.index.search(&embedding, request.top_k).await?;

        if matches.is_empty() {
            debug!("Vector recall: no results for {:?}", request.query);
            return Ok(Vec::new());
        }

        let hits = matches
            .into_iter()
            .enumerate()
            .map(|(i, m)| {
                let score = m.score.clamp(0.0, 1.0);
                let mut hit = RecallHit::new(
                    self.source_name(),
                    score,
                    score,
                    format!("Vector similarity match (similarity: {:.3})", score),
                    m.content,
                );

                hit = hit
                    .with_metadata(
                        "title",
                        m.metadata
                            .get("title")
                            .cloned()
                            .unwrap_or_else(|| serde_json::json!("Untitled document")),
                    )
                    .with_metadata(
                        "url",
                        m.metadata
                            .get("url")
                            .cloned()
                            .unwrap_or_else(|| serde_json::json!("")),
                    )
                    .with_metadata(
                        "category",
                        m.metadata
                            .get("category")
                            .cloned()
                            .unwrap_or_else(|| serde_json::json!("unknown")),
                    )
                    .with_metadata("rank", serde_json::json!(i + 1))
                    .with_metadata("vector_id", serde_json::json!(m.id));
                hit
            })
            .collect::<Vec<_>>();

        debug!(
            "Vector recall: {} hits for {:?} (top score: {:.3})",
            hits.len(),
            request.query,
            hits.first().map(|h| h.score).unwrap_or(0.0)
        );

        Ok(hits)
    }
}
