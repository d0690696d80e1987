//! Curated-FAQ retrieval source.
//!
//! Matches the query against a small curated corpus of question/answer
//! entries using term overlap and keyword lists.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use recall_core::{RecallHit, RecallRequest, RecallSource, Result};

/// Minimum score for an entry to count as a hit.
const MIN_SCORE: f32 = 0.3;

/// A curated FAQ entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Stable entry identifier.
    pub id: String,

    /// The canonical question.
    pub question: String,

    /// The curated answer.
    pub answer: String,

    /// Category label.
    pub category: String,

    /// Keywords associated with this entry.
    pub keywords: Vec<String>,
}

/// FAQ retrieval source over an in-memory corpus.
pub struct FaqSource {
    entries: Vec<FaqEntry>,
}

impl FaqSource {
    /// Create a source over the given entries.
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self { entries }
    }

    /// Load entries from a JSON file (an array of [`FaqEntry`]).
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<FaqEntry> = serde_json::from_str(&content)?;
        Ok(Self::new(entries))
    }

    /// Score one entry against the (lowercased) query.
    ///
    /// Combines question-term overlap, keyword-list overlap, answer-term
    /// overlap, and an exact-match bonus, clipped to [0, 1].
    fn score(&self, query: &str, entry: &FaqEntry) -> f32 {
        let mut score = 0.0;

        // Question match carries the most weight
        let question = entry.question.to_lowercase();
        if query.split_whitespace().any(|word| question.contains(word)) {
            score += 0.4;
        }

        // Keyword overlap
        let matched = entry
            .keywords
            .iter()
            .filter(|keyword| query.contains(&keyword.to_lowercase()))
            .count();
        if matched > 0 {
            score += (matched as f32 / entry.keywords.len() as f32) * 0.4;
        }

        // Answer content match
        let answer = entry.answer.to_lowercase();
        if query.split_whitespace().any(|word| answer.contains(word)) {
            score += 0.2;
        }

        // Exact-match bonus
        if question.contains(query)
            || entry
                .keywords
                .iter()
                .any(|keyword| query.contains(&keyword.to_lowercase()))
        {
            score += 0.2;
        }

        score.min(1.0)
    }
}

#[async_trait]
impl RecallSource for FaqSource {
    fn source_name(&self) -> &str {
        "faq"
    }

    async fn acquire(&self, request: &RecallRequest) -> Result<Vec<RecallHit>> {
        let query = request.query.to_lowercase();

        let mut hits: Vec<RecallHit> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = self.score(&query, entry);
                if score <= MIN_SCORE {
                    return None;
                }

                Some(
                    RecallHit::new(
                        self.source_name(),
                        score,
                        (score * 1.2).min(1.0),
                        format!("FAQ keyword match (score: {:.3})", score),
                        format!("Q: {}\nA: {}", entry.question, entry.answer),
                    )
                    .with_metadata("faq_id", serde_json::json!(entry.id))
                    .with_metadata("question", serde_json::json!(entry.question))
                    .with_metadata("answer", serde_json::json!(entry.answer))
                    .with_metadata("category", serde_json::json!(entry.category))
                    .with_metadata("match_type", serde_json::json!("keyword")),
                )
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(request.top_k);

        debug!(
            "FAQ recall: {} hits for {:?} (top score: {:.3})",
            hits.len(),
            request.query,
            hits.first().map(|h| h.score).unwrap_or(0.0)
        );

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<FaqEntry> {
        vec![
            FaqEntry {
                id: "faq_001".to_string(),
                question: "What is your refund policy?".to_string(),
                answer: "We offer a 30-day no-questions-asked refund, provided the item \
                         is returned in its original packaging."
                    .to_string(),
                category: "refunds".to_string(),
                keywords: vec![
                    "refund".to_string(),
                    "return".to_string(),
                    "money back".to_string(),
                    "30 days".to_string(),
                ],
            },
            FaqEntry {
                id: "faq_002".to_string(),
                question: "How do I contact support?".to_string(),
                answer: "Reach us via live chat, phone at 555-0123, or email at \
                         support@example.com."
                    .to_string(),
                category: "contact".to_string(),
                keywords: vec![
                    "support".to_string(),
                    "contact".to_string(),
                    "phone".to_string(),
                    "email".to_string(),
                ],
            },
            FaqEntry {
                id: "faq_003".to_string(),
                question: "How long does shipping take?".to_string(),
                answer: "Standard shipping takes 3-5 business days; express takes 1-2."
                    .to_string(),
                category: "shipping".to_string(),
                keywords: vec![
                    "shipping".to_string(),
                    "delivery".to_string(),
                    "business days".to_string(),
                ],
            },
        ]
    }

    fn request(query: &str) -> RecallRequest {
        RecallRequest::new(query, "session-1")
    }

    #[tokio::test]
    async fn test_matching_query_returns_hits() {
        let source = FaqSource::new(entries());

        let hits = source.acquire(&request("what is the refund policy")).await.unwrap();

        assert!(!hits.is_empty());
        assert_eq!(hits[0].metadata["faq_id"], serde_json::json!("faq_001"));
        assert!(hits[0].content.starts_with("Q: "));
    }

    #[tokio::test]
    async fn test_unrelated_query_returns_empty() {
        let source = FaqSource::new(entries());

        let hits = source.acquire(&request("quantum chromodynamics")).await.unwrap();

        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_scores_within_bounds_and_sorted() {
        let source = FaqSource::new(entries());

        let hits = source
            .acquire(&request("contact support about refund shipping"))
            .await
            .unwrap();

        for hit in &hits {
            assert!(hit.score > MIN_SCORE && hit.score <= 1.0);
            assert!(hit.confidence <= 1.0);
        }
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_truncates_to_top_k() {
        let source = FaqSource::new(entries());

        let request = request("contact support about refund shipping delivery").with_top_k(1);
        let hits = source.acquire(&request).await.unwrap();

        assert!(hits.len() <= 1);
    }

    #[tokio::test]
    async fn test_confidence_derated_from_score() {
        let source = FaqSource::new(entries());

        let hits = source.acquire(&request("refund")).await.unwrap();

        for hit in &hits {
            assert!((hit.confidence - (hit.score * 1.2).min(1.0)).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_source_name() {
        assert_eq!(FaqSource::new(Vec::new()).source_name(), "faq");
    }
}
