//! Core domain types for the recall engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Number of leading characters of hit content used for deduplication.
///
/// Two hits whose content agrees on this prefix are considered the same
/// underlying answer during merge.
pub const FINGERPRINT_CHARS: usize = 100;

/// Source tag carried by the synthetic hit produced when recall degrades.
pub const FALLBACK_SOURCE: &str = "fallback";

/// A single recall invocation.
///
/// Immutable once constructed; every pipeline stage reads it, none mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallRequest {
    /// The user's query text (non-empty).
    pub query: String,

    /// Conversation session identifier.
    pub session_id: String,

    /// Correlation id propagated through logs and the result envelope.
    ///
    /// Caller-supplied, or generated as a ULID by [`RecallRequest::new`].
    pub trace_id: String,

    /// Optional user profile attributes (source-specific use).
    #[serde(default)]
    pub user_profile: Option<HashMap<String, serde_json::Value>>,

    /// Optional prior-context strings from the conversation.
    #[serde(default)]
    pub context: Option<Vec<String>>,

    /// Experiment identifier, if this request runs under an experiment.
    #[serde(default)]
    pub experiment_id: Option<String>,

    /// Requested result count.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl RecallRequest {
    /// Create a request with a generated trace id and default `top_k`.
    pub fn new(query: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: session_id.into(),
            trace_id: Ulid::new().to_string(),
            user_profile: None,
            context: None,
            experiment_id: None,
            top_k: default_top_k(),
        }
    }

    /// Use a caller-supplied trace id instead of the generated one.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Tag the request with an experiment identifier.
    pub fn with_experiment(mut self, experiment_id: impl Into<String>) -> Self {
        self.experiment_id = Some(experiment_id.into());
        self
    }

    /// Set the requested result count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// One candidate result from a retrieval source.
///
/// Hits are value objects: weighting produces a new hit rather than
/// mutating the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallHit {
    /// Name of the source that produced this hit (or `"fallback"`).
    pub source: String,

    /// Relevance score in [0, 1]. Raw as reported by the source until the
    /// merge engine applies the source weight.
    pub score: f32,

    /// Source-reported confidence in [0, 1]; may differ from `score`.
    pub confidence: f32,

    /// Human-readable explanation of why this hit matched.
    pub reason: String,

    /// The matched content text.
    pub content: String,

    /// Open metadata map (title, url, category, rule id, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RecallHit {
    /// Create a hit with empty metadata.
    pub fn new(
        source: impl Into<String>,
        score: f32,
        confidence: f32,
        reason: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            score,
            confidence,
            reason: reason.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Produce a new hit with the source weight applied to the score.
    ///
    /// The pre-weight score and the weight are recorded in metadata so the
    /// adjustment stays auditable.
    pub fn weighted(&self, weight: f32) -> Self {
        let mut hit = self.clone();
        hit.score = self.score * weight;
        hit.metadata.insert(
            "original_score".to_string(),
            serde_json::json!(self.score),
        );
        hit.metadata
            .insert("weight".to_string(), serde_json::json!(weight));
        hit
    }

    /// Content fingerprint used for deduplication.
    ///
    /// Blake3 digest of the first [`FINGERPRINT_CHARS`] characters of the
    /// content. Character-based so multi-byte text never splits a boundary;
    /// two hits with identical leading content always collide.
    pub fn fingerprint(&self) -> String {
        let prefix: String = self.content.chars().take(FINGERPRINT_CHARS).collect();
        hex::encode(blake3::hash(prefix.as_bytes()).as_bytes())
    }
}

/// The final recall envelope returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallResult {
    /// Ranked hits. Empty, or exactly one synthetic hit when degraded.
    pub hits: Vec<RecallHit>,

    /// Wall-clock latency of the invocation in milliseconds.
    pub latency_ms: u64,

    /// True iff the fallback path replaced the merged hits.
    pub degraded: bool,

    /// Trace id copied from the request.
    pub trace_id: String,

    /// Experiment id copied from the request, if any.
    pub experiment_id: Option<String>,
}
