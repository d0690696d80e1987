//! Top-level recall engine.
//!
//! Wires the pipeline stages into one linear flow: resolve configuration,
//! fan out, merge, apply degradation, assemble the result envelope. The
//! single entry point [`RecallEngine::invoke`] never fails; retrieval is
//! best-effort and total failure is expressed as a degraded result, not an
//! error the caller has to handle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use recall_core::{
    RecallConfig, RecallError, RecallHit, RecallRequest, RecallResult, RecallSource, Result,
};

use crate::{degrade, dispatch, merge};

/// Maximum query length copied into the telemetry record.
const QUERY_LOG_CHARS: usize = 100;

/// Recall orchestration engine.
///
/// Holds the base configuration and a registry of retrieval sources keyed
/// by [`RecallSource::source_name`]. Which registered sources actually run
/// is decided per request by the resolved configuration's enabled list.
pub struct RecallEngine {
    /// Base configuration snapshot.
    config: RecallConfig,

    /// Registered sources, keyed by name.
    sources: HashMap<String, Arc<dyn RecallSource>>,
}

impl RecallEngine {
    /// Create an engine with no registered sources.
    pub fn new(config: RecallConfig) -> Self {
        Self {
            config,
            sources: HashMap::new(),
        }
    }

    /// Register a retrieval source under its own name.
    ///
    /// Registering a second source with the same name replaces the first.
    pub fn register(mut self, source: Arc<dyn RecallSource>) -> Self {
        self.sources
            .insert(source.source_name().to_string(), source);
        self
    }

    /// The base configuration this engine resolves from.
    pub fn config(&self) -> &RecallConfig {
        &self.config
    }

    /// Run one recall invocation.
    ///
    /// Never fails: any internal error is converted into a degraded result
    /// carrying the request's trace id and the elapsed latency.
    pub async fn invoke(&self, request: RecallRequest) -> RecallResult {
        let start = Instant::now();
        let request = Arc::new(request);

        info!(
            "Recall invoked: trace_id={}, query len {}",
            request.trace_id,
            request.query.len()
        );

        match self.run(&request, start).await {
            Ok(result) => result,
            Err(err) => {
                error!("Recall pipeline failed for trace {}: {}", request.trace_id, err);

                let result = RecallResult {
                    hits: Vec::new(),
                    latency_ms: start.elapsed().as_millis() as u64,
                    degraded: true,
                    trace_id: request.trace_id.clone(),
                    experiment_id: request.experiment_id.clone(),
                };
                emit_telemetry(&request, &result);
                result
            }
        }
    }

    async fn run(&self, request: &Arc<RecallRequest>, start: Instant) -> Result<RecallResult> {
        if request.query.trim().is_empty() {
            return Err(RecallError::internal("empty query"));
        }

        let config = self.config.resolve(request.experiment_id.as_deref());
        debug!(
            "Resolved config: sources {:?}, timeout {:?}, retry {}",
            config.sources, config.timeout, config.retry
        );

        let source_results = dispatch::fan_out(&self.sources, request, &config).await;
        let merged = merge::merge_hits(source_results, &config.weights, request.top_k);
        let (hits, degraded) = degrade::apply_degradation(merged, &config);

        let result = assemble(request, hits, degraded, start);
        emit_telemetry(request, &result);

        Ok(result)
    }
}

/// Build the final result envelope.
fn assemble(
    request: &RecallRequest,
    hits: Vec<RecallHit>,
    degraded: bool,
    start: Instant,
) -> RecallResult {
    RecallResult {
        hits,
        latency_ms: start.elapsed().as_millis() as u64,
        degraded,
        trace_id: request.trace_id.clone(),
        experiment_id: request.experiment_id.clone(),
    }
}

/// Emit the per-invocation telemetry record.
///
/// Observability only: a plain structured event that cannot fail or block
/// the response path.
fn emit_telemetry(request: &RecallRequest, result: &RecallResult) {
    let query: String = request.query.chars().take(QUERY_LOG_CHARS).collect();

    let mut sources: Vec<&str> = result.hits.iter().map(|h| h.source.as_str()).collect();
    sources.sort_unstable();
    sources.dedup();

    // Hits are sorted descending, so the first score is the max
    let max_score = result.hits.first().map(|h| h.score).unwrap_or(0.0);
    let mean_score = if result.hits.is_empty() {
        0.0
    } else {
        result.hits.iter().map(|h| h.score).sum::<f32>() / result.hits.len() as f32
    };

    info!(
        target: "recall::telemetry",
        trace_id = %result.trace_id,
        experiment_id = result.experiment_id.as_deref().unwrap_or(""),
        session_id = %request.session_id,
        query = %query,
        sources = ?sources,
        hit_count = result.hits.len(),
        latency_ms = result.latency_ms,
        degraded = result.degraded,
        mean_score,
        max_score,
        "recall completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recall_core::FALLBACK_SOURCE;
    use std::time::Duration;

    struct StaticSource {
        name: &'static str,
        hits: Vec<RecallHit>,
    }

    #[async_trait]
    impl RecallSource for StaticSource {
        fn source_name(&self) -> &str {
            self.name
        }

        async fn acquire(&self, request: &RecallRequest) -> Result<Vec<RecallHit>> {
            let mut hits = self.hits.clone();
            hits.truncate(request.top_k);
            Ok(hits)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl RecallSource for FailingSource {
        fn source_name(&self) -> &str {
            "vector"
        }

        async fn acquire(&self, _request: &RecallRequest) -> Result<Vec<RecallHit>> {
            Err(RecallError::source("vector", "index unavailable"))
        }
    }

    struct SlowSource {
        delay: Duration,
    }

    #[async_trait]
    impl RecallSource for SlowSource {
        fn source_name(&self) -> &str {
            "vector"
        }

        async fn acquire(&self, _request: &RecallRequest) -> Result<Vec<RecallHit>> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![RecallHit::new("vector", 0.9, 0.9, "slow", "slow answer")])
        }
    }

    fn hit(source: &str, score: f32, content: &str) -> RecallHit {
        RecallHit::new(source, score, score, "test match", content)
    }

    fn base_config(sources: &[&str]) -> RecallConfig {
        RecallConfig {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            retry: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_weighted_merge_across_sources() {
        // vector hit 0.6 @ 1.0 outranks faq hit 0.8 @ 0.5
        let config = RecallConfig {
            sources: vec!["vector".to_string(), "faq".to_string()],
            source_weights: "vector:1.0,faq:0.5".to_string(),
            retry: 0,
            ..Default::default()
        };
        let engine = RecallEngine::new(config)
            .register(Arc::new(StaticSource {
                name: "vector",
                hits: vec![hit("vector", 0.6, "vector answer")],
            }))
            .register(Arc::new(StaticSource {
                name: "faq",
                hits: vec![hit("faq", 0.8, "faq answer")],
            }));

        let result = engine.invoke(RecallRequest::new("query", "s")).await;

        assert!(!result.degraded);
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[0].source, "vector");
        assert!((result.hits[0].score - 0.6).abs() < 1e-6);
        assert_eq!(result.hits[1].source, "faq");
        assert!((result.hits[1].score - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_sources_degrade_to_fallback() {
        let engine = RecallEngine::new(base_config(&["faq"])).register(Arc::new(StaticSource {
            name: "faq",
            hits: Vec::new(),
        }));

        let result = engine.invoke(RecallRequest::new("query", "s")).await;

        assert!(result.degraded);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].source, FALLBACK_SOURCE);
    }

    #[tokio::test]
    async fn test_timeout_leaves_surviving_source() {
        let config = RecallConfig {
            sources: vec!["vector".to_string(), "faq".to_string()],
            timeout_ms: 50,
            retry: 0,
            ..Default::default()
        };
        let engine = RecallEngine::new(config)
            .register(Arc::new(SlowSource {
                delay: Duration::from_secs(5),
            }))
            .register(Arc::new(StaticSource {
                name: "faq",
                hits: vec![hit("faq", 0.8, "faq answer")],
            }));

        let result = engine.invoke(RecallRequest::new("query", "s")).await;

        assert!(!result.degraded);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].source, "faq");
    }

    #[tokio::test]
    async fn test_duplicate_content_deduplicated() {
        let engine = RecallEngine::new(base_config(&["vector", "faq"]))
            .register(Arc::new(StaticSource {
                name: "vector",
                hits: vec![hit("vector", 0.7, "the shared answer")],
            }))
            .register(Arc::new(StaticSource {
                name: "faq",
                hits: vec![hit("faq", 0.9, "the shared answer")],
            }));

        let result = engine.invoke(RecallRequest::new("query", "s")).await;

        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].source, "faq");
        assert!((result.hits[0].score - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_partial_failure_tolerated() {
        let engine = RecallEngine::new(base_config(&["vector", "faq"]))
            .register(Arc::new(FailingSource))
            .register(Arc::new(StaticSource {
                name: "faq",
                hits: vec![hit("faq", 0.8, "faq answer")],
            }));

        let result = engine.invoke(RecallRequest::new("query", "s")).await;

        assert!(!result.degraded);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].source, "faq");
    }

    #[tokio::test]
    async fn test_all_sources_failing_degrades() {
        let engine = RecallEngine::new(base_config(&["vector"])).register(Arc::new(FailingSource));

        let result = engine.invoke(RecallRequest::new("query", "s")).await;

        assert!(result.degraded);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].source, FALLBACK_SOURCE);
        assert_eq!(
            result.hits[0].metadata["degrade_reason"],
            serde_json::json!("no_results")
        );
    }

    #[tokio::test]
    async fn test_top_k_bounds_result() {
        let hits: Vec<RecallHit> = (0..10)
            .map(|i| hit("faq", 0.9 - 0.01 * i as f32, &format!("answer number {}", i)))
            .collect();
        let engine = RecallEngine::new(base_config(&["faq"]))
            .register(Arc::new(StaticSource { name: "faq", hits }));

        let request = RecallRequest::new("query", "s").with_top_k(3);
        let result = engine.invoke(request).await;

        assert!(!result.degraded);
        assert_eq!(result.hits.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_query_returns_degraded_envelope() {
        let engine = RecallEngine::new(base_config(&["faq"])).register(Arc::new(StaticSource {
            name: "faq",
            hits: vec![hit("faq", 0.8, "answer")],
        }));

        let request = RecallRequest::new("   ", "s").with_trace_id("trace-7");
        let result = engine.invoke(request).await;

        assert!(result.degraded);
        assert!(result.hits.is_empty());
        assert_eq!(result.trace_id, "trace-7");
    }

    #[tokio::test]
    async fn test_experiment_id_propagates() {
        let mut experiments = HashMap::new();
        experiments.insert(
            "exp-weight-adjust".to_string(),
            recall_core::ExperimentOverride {
                weights: Some(HashMap::from([("faq".to_string(), 0.5)])),
                ..Default::default()
            },
        );
        let config = RecallConfig {
            sources: vec!["faq".to_string()],
            experiment_enabled: true,
            experiments,
            retry: 0,
            degrade_threshold: 0.1,
            ..Default::default()
        };
        let engine = RecallEngine::new(config).register(Arc::new(StaticSource {
            name: "faq",
            hits: vec![hit("faq", 0.8, "answer")],
        }));

        let request = RecallRequest::new("query", "s").with_experiment("exp-weight-adjust");
        let result = engine.invoke(request).await;

        assert_eq!(result.experiment_id.as_deref(), Some("exp-weight-adjust"));
        // Experiment weight applied
        assert!((result.hits[0].score - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_fallback_disabled_returns_empty() {
        let config = RecallConfig {
            sources: vec!["faq".to_string()],
            fallback_enabled: false,
            retry: 0,
            ..Default::default()
        };
        let engine = RecallEngine::new(config).register(Arc::new(StaticSource {
            name: "faq",
            hits: Vec::new(),
        }));

        let result = engine.invoke(RecallRequest::new("query", "s")).await;

        assert!(!result.degraded);
        assert!(result.hits.is_empty());
    }
}
