//! Weighted merge of per-source hit lists.
//!
//! Order of operations: weight, dedup, rank, truncate. The input map
//! carries no cross-source ordering, so determinism is guaranteed only in
//! the sorted output. Ties keep encounter order (stable sort, no secondary
//! key).

use std::collections::HashMap;

use tracing::debug;

use recall_core::RecallHit;

/// Merge per-source results into one ranked, deduplicated hit list.
///
/// Each hit's score is multiplied by its source's weight (1.0 when the
/// weight map has no entry), hits sharing a content fingerprint are reduced
/// to the highest-scoring one, and the result is sorted descending and
/// truncated to `top_k`.
pub fn merge_hits(
    results: HashMap<String, Vec<RecallHit>>,
    weights: &HashMap<String, f32>,
    top_k: usize,
) -> Vec<RecallHit> {
    let mut all_hits = Vec::new();
    for (source, hits) in results {
        let weight = weights.get(&source).copied().unwrap_or(1.0);
        for hit in hits {
            all_hits.push(hit.weighted(weight));
        }
    }
    let total = all_hits.len();

    let mut merged = deduplicate(all_hits);

    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged.truncate(top_k);

    debug!("Merged {} hits into {} results", total, merged.len());

    merged
}

/// Collapse hits sharing a content fingerprint, keeping the highest score.
///
/// Keep-max is order-insensitive; surviving hits stay at their first
/// encounter position.
fn deduplicate(hits: Vec<RecallHit>) -> Vec<RecallHit> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut deduped: Vec<RecallHit> = Vec::new();

    for hit in hits {
        let key = hit.fingerprint();
        match index.get(&key) {
            Some(&i) => {
                if hit.score > deduped[i].score {
                    deduped[i] = hit;
                }
            }
            None => {
                index.insert(key, deduped.len());
                deduped.push(hit);
            }
        }
    }

    deduped
}
