//! Keyword/rule retrieval source.
//!
//! Matches the query against a rule library using direct keyword overlap,
//! regex patterns, and a synonym table, with a per-rule priority
//! multiplier.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use recall_core::{RecallError, RecallHit, RecallRequest, RecallSource, Result};

/// Minimum score for a rule to count as a hit.
const MIN_SCORE: f32 = 0.3;

/// A keyword rule as written in the rule file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Stable rule identifier.
    pub id: String,

    /// Keywords that trigger this rule.
    pub keywords: Vec<String>,

    /// The canned content returned when the rule matches.
    pub content: String,

    /// Category label.
    pub category: String,

    /// Priority multiplier in [0, 1].
    pub priority: f32,

    /// Regex patterns that also trigger this rule.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// A rule file: rules plus a shared synonym table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordRuleSet {
    /// The rule library.
    pub rules: Vec<KeywordRule>,

    /// Synonym table: keyword → equivalent terms.
    #[serde(default)]
    pub synonyms: HashMap<String, Vec<String>>,
}

struct CompiledRule {
    rule: KeywordRule,
    patterns: Vec<Regex>,
}

/// Keyword/rule retrieval source.
pub struct KeywordSource {
    rules: Vec<CompiledRule>,
    synonyms: HashMap<String, Vec<String>>,
}

impl KeywordSource {
    /// Build a source from a rule set, compiling the regex patterns.
    ///
    /// An invalid pattern fails construction rather than every query.
    pub fn new(rule_set: KeywordRuleSet) -> Result<Self> {
        let mut rules = Vec::with_capacity(rule_set.rules.len());

        for rule in rule_set.rules {
            let patterns = rule
                .patterns
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            RecallError::config(format!(
                                "Invalid pattern in rule {}: {}",
                                rule.id, e
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            rules.push(CompiledRule { rule, patterns });
        }

        Ok(Self {
            rules,
            synonyms: rule_set.synonyms,
        })
    }

    /// Load a rule set from a JSON file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let rule_set: KeywordRuleSet = serde_json::from_str(&content)?;
        Self::new(rule_set)
    }

    /// Score one rule against the (lowercased) query.
    ///
    /// Keyword overlap, regex match, and synonym overlap are combined,
    /// scaled by the rule priority, with an exact-keyword bonus, clipped
    /// to [0, 1].
    fn score(&self, query: &str, compiled: &CompiledRule) -> f32 {
        let rule = &compiled.rule;
        let mut score = 0.0;

        // Direct keyword overlap
        let matched = rule
            .keywords
            .iter()
            .filter(|keyword| query.contains(&keyword.to_lowercase()))
            .count();
        if matched > 0 {
            score += (matched as f32 / rule.keywords.len() as f32) * 0.4;
        }

        // First matching regex pattern
        if compiled.patterns.iter().any(|pattern| pattern.is_match(query)) {
            score += 0.3;
        }

        // Synonym overlap
        let synonym_matches = rule
            .keywords
            .iter()
            .filter(|keyword| {
                self.synonyms
                    .get(keyword.as_str())
                    .map(|synonyms| synonyms.iter().any(|syn| query.contains(&syn.to_lowercase())))
                    .unwrap_or(false)
            })
            .count();
        if synonym_matches > 0 {
            score += (synonym_matches as f32 / rule.keywords.len() as f32) * 0.2;
        }

        // Priority scaling, then the exact-keyword bonus
        score *= rule.priority;
        if rule
            .keywords
            .iter()
            .any(|keyword| query.contains(&keyword.to_lowercase()))
        {
            score += 0.1;
        }

        score.min(1.0)
    }
}

#[async_trait]
impl RecallSource for KeywordSource {
    fn source_name(&self) -> &str {
        "keyword"
    }

    async fn acquire(&self, request: &RecallRequest) -> Result<Vec<RecallHit>> {
        let query = request.query.to_lowercase();

        let mut hits: Vec<RecallHit> = self
            .rules
            .iter()
            .filter_map(|compiled| {
                let score = self.score(&query, compiled);
                if score <= MIN_SCORE {
                    return None;
                }

                let rule = &compiled.rule;
                Some(
                    RecallHit::new(
                        self.source_name(),
                        score,
                        (score * 1.1).min(1.0),
                        format!("Keyword rule match (rule: {}, score: {:.3})", rule.id, score),
                        rule.content.clone(),
                    )
                    .with_metadata("rule_id", serde_json::json!(rule.id))
                    .with_metadata("category", serde_json::json!(rule.category))
                    .with_metadata("priority", serde_json::json!(rule.priority))
                    .with_metadata("keywords", serde_json::json!(rule.keywords))
                    .with_metadata("match_type", serde_json::json!("keyword_rule")),
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
            "Keyword recall: {} hits for {:?} (top score: {:.3})",
            hits.len(),
            request.query,
            hits.first().map(|h| h.score).unwrap_or(0.0)
        );

        Ok(hits)
    }
}
