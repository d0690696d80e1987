//! Degradation policy.
//!
//! A two-state decision evaluated once per request: pass the merged hits
//! through, or replace them with a single synthetic fallback hit.

use tracing::warn;

use recall_core::{RecallHit, ResolvedConfig, FALLBACK_SOURCE};

/// Score and confidence carried by the synthetic fallback hit.
pub const FALLBACK_SCORE: f32 = 0.1;

const FALLBACK_CONTENT: &str = "Sorry, I couldn't find relevant information for that. \
You could try rephrasing the question with different keywords, or contact support for help.";

/// Apply the degradation rule to the merged hit list.
///
/// Degrades when the list is empty or its best score is below the
/// configured threshold, and fallback is enabled. Returns the final hit
/// list and the degraded flag; with fallback disabled the input passes
/// through unchanged.
pub fn apply_degradation(hits: Vec<RecallHit>, config: &ResolvedConfig) -> (Vec<RecallHit>, bool) {
    let needs_fallback = hits.is_empty() || hits[0].score < config.degrade_threshold;

    if !needs_fallback || !config.fallback_enabled {
        return (hits, false);
    }

    let degrade_reason = if hits.is_empty() { "no_results" } else { "low_score" };
    warn!(
        "Degrading recall result: {} (threshold: {})",
        degrade_reason, config.degrade_threshold
    );

    let fallback = RecallHit::new(
        FALLBACK_SOURCE,
        FALLBACK_SCORE,
        FALLBACK_SCORE,
        "Recall degraded: no sufficiently relevant results",
        FALLBACK_CONTENT,
    )
    .with_metadata("fallback", serde_json::json!(true))
    .with_metadata("degrade_reason", serde_json::json!(degrade_reason));

    (vec![fallback], true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::MergeStrategy;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config(threshold: f32, fallback_enabled: bool) -> ResolvedConfig {
        ResolvedConfig {
            sources: vec!["faq".to_string()],
            weights: HashMap::from([("faq".to_string(), 1.0)]),
            timeout: Duration::from_millis(500),
            retry: 0,
            merge_strategy: MergeStrategy::Weighted,
            degrade_threshold: threshold,
            fallback_enabled,
            experiment_id: None,
        }
    }

    fn hit(score: f32) -> RecallHit {
        RecallHit::new("faq", score, score, "match", "an answer")
    }

    #[test]
    fn test_empty_hits_degrade() {
        let (hits, degraded) = apply_degradation(Vec::new(), &config(0.5, true));

        assert!(degraded);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, FALLBACK_SOURCE);
        assert_eq!(hits[0].metadata["degrade_reason"], serde_json::json!("no_results"));
    }

    #[test]
    fn test_low_score_degrades() {
        let (hits, degraded) = apply_degradation(vec![hit(0.3)], &config(0.5, true));

        assert!(degraded);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["degrade_reason"], serde_json::json!("low_score"));
        assert!((hits[0].score - FALLBACK_SCORE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_good_score_passes_through() {
        let (hits, degraded) = apply_degradation(vec![hit(0.8), hit(0.6)], &config(0.5, true));

        assert!(!degraded);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "faq");
    }

    #[test]
    fn test_fallback_disabled_passes_empty_through() {
        let (hits, degraded) = apply_degradation(Vec::new(), &config(0.5, false));

        assert!(!degraded);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_fallback_disabled_passes_low_score_through() {
        let (hits, degraded) = apply_degradation(vec![hit(0.1)], &config(0.5, false));

        assert!(!degraded);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_threshold_monotonicity() {
        // Threshold above the top score always degrades; below never does
        let (_, above) = apply_degradation(vec![hit(0.6)], &config(0.7, true));
        let (_, below) = apply_degradation(vec![hit(0.6)], &config(0.4, true));

        assert!(above);
        assert!(!below);
    }

    #[test]
    fn test_boundary_score_equal_to_threshold() {
        // Rule is strict less-than: a top score equal to the threshold passes
        let (_, degraded) = apply_degradation(vec![hit(0.5)], &config(0.5, true));
        assert!(!degraded);
    }
}
