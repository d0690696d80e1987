//! Deterministic embedder and in-memory index for tests and demos.

use std::collections::HashMap;

use async_trait::async_trait;

use recall_core::{Embedder, IndexMatch, Result, VectorIndex};

/// Mock embedder producing deterministic hash-derived vectors.
///
/// Identical texts embed identically, so cosine similarity of a text with
/// itself is 1.0. Useful for testing without a real model.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Create a mock embedder with default settings.
    pub fn new() -> Self {
        Self { dimension: 64 }
    }

    /// Create a mock embedder with a custom dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        // Deterministic embedding from a rolling byte hash
        let hash = text
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

        let mut embedding = vec![0.0f32; self.dimension];
        for (i, v) in embedding.iter_mut().enumerate() {
            *v = ((hash.wrapping_mul(i as u64 + 1)) as f32 % 1000.0) / 1000.0 - 0.5;
        }

        // L2 normalize
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

struct IndexEntry {
    id: String,
    embedding: Vec<f32>,
    content: String,
    metadata: HashMap<String, serde_json::Value>,
}

/// In-memory vector index using cosine similarity.
pub struct MemoryIndex {
    entries: Vec<IndexEntry>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry to the index.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        embedding: Vec<f32>,
        content: impl Into<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) {
        self.entries.push(IndexEntry {
            id: id.into(),
            embedding,
            content: content.into(),
            metadata,
        });
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexMatch>> {
        let mut matches: Vec<IndexMatch> = self
            .entries
            .iter()
            .map(|entry| IndexMatch {
                id: entry.id.clone(),
                score: cosine(embedding, &entry.embedding),
                content: entry.content.clone(),
                metadata: entry.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);

        Ok(matches)
    }
}
