//! Configuration for the recall engine.
//!
//! The engine never reads global state: a [`RecallConfig`] snapshot is
//! resolved into a per-request [`ResolvedConfig`] by a pure merge of the
//! base settings with an optional experiment override. Two concurrent
//! requests with different experiment ids never interfere.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{RecallError, Result};

/// How per-source result lists are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Multiply each hit's score by its source weight, dedup, rank.
    #[default]
    Weighted,
}

/// Base configuration snapshot for the recall engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallConfig {
    /// Enabled source names, in configuration order.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    /// Per-source weights as a `name:weight[,name:weight...]` list.
    ///
    /// Malformed entries are skipped silently; enabled sources without an
    /// entry default to weight 1.0 at resolution time.
    #[serde(default)]
    pub source_weights: String,

    /// Shared deadline for every source call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Per-source retry count (0-3; clamped at resolution time).
    #[serde(default = "default_retry")]
    pub retry: u32,

    /// Merge strategy tag.
    #[serde(default)]
    pub merge_strategy: MergeStrategy,

    /// Degrade when the best merged score falls below this threshold.
    #[serde(default = "default_degrade_threshold")]
    pub degrade_threshold: f32,

    /// Whether the fallback path may replace poor results.
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,

    /// Whether experiment overrides are honored at all.
    #[serde(default)]
    pub experiment_enabled: bool,

    /// Declarative experiment overrides, keyed by experiment id.
    #[serde(default)]
    pub experiments: HashMap<String, ExperimentOverride>,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            source_weights: String::new(),
            timeout_ms: default_timeout_ms(),
            retry: default_retry(),
            merge_strategy: MergeStrategy::default(),
            degrade_threshold: default_degrade_threshold(),
            fallback_enabled: true,
            experiment_enabled: false,
            experiments: HashMap::new(),
        }
    }
}

/// An experiment-scoped configuration override.
///
/// Fields left unset inherit from the base configuration. `weights`
/// entries replace or add to the base weight map rather than discarding it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentOverride {
    /// Replacement enabled-source list.
    pub sources: Option<Vec<String>>,

    /// Weight entries to replace or add.
    pub weights: Option<HashMap<String, f32>>,

    /// Replacement shared timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Effective configuration for a single request.
///
/// Derived per-request; never cached or shared mutably.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Enabled source names.
    pub sources: Vec<String>,

    /// Complete weight map: every enabled source has an entry.
    pub weights: HashMap<String, f32>,

    /// Shared deadline for every source call.
    pub timeout: Duration,

    /// Per-source retry count.
    pub retry: u32,

    /// Merge strategy tag.
    pub merge_strategy: MergeStrategy,

    /// Degradation score threshold.
    pub degrade_threshold: f32,

    /// Whether the fallback path may replace poor results.
    pub fallback_enabled: bool,

    /// The experiment id that was applied, if any.
    pub experiment_id: Option<String>,
}

impl RecallConfig {
    /// Resolve the effective configuration for one request.
    ///
    /// Pure: reads the base snapshot and the request's experiment id only.
    pub fn resolve(&self, experiment_id: Option<&str>) -> ResolvedConfig {
        let mut sources = self.sources.clone();
        let mut weights = parse_source_weights(&self.source_weights);
        let mut timeout_ms = self.timeout_ms;
        let mut applied_experiment = None;

        if self.experiment_enabled {
            if let Some(id) = experiment_id {
                if let Some(exp) = self.experiments.get(id) {
                    if let Some(exp_sources) = &exp.sources {
                        sources = exp_sources.clone();
                    }
                    if let Some(exp_weights) = &exp.weights {
                        weights.extend(exp_weights.clone());
                    }
                    if let Some(exp_timeout) = exp.timeout_ms {
                        timeout_ms = exp_timeout;
                    }
                    applied_experiment = Some(id.to_string());
                }
            }
        }

        // Every enabled source gets a weight before the merge engine runs
        for source in &sources {
            weights.entry(source.clone()).or_insert(1.0);
        }

        ResolvedConfig {
            sources,
            weights,
            timeout: Duration::from_millis(timeout_ms),
            retry: self.retry.min(3),
            merge_strategy: self.merge_strategy,
            degrade_threshold: self.degrade_threshold,
            fallback_enabled: self.fallback_enabled,
            experiment_id: applied_experiment,
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| RecallError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("recall").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("recall.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }
}

/// Parse a `name:weight[,name:weight...]` list into a weight map.
///
/// Entries that don't split on `:` or whose weight isn't a float are
/// skipped silently; the affected source falls back to the default weight.
pub fn parse_source_weights(weights_str: &str) -> HashMap<String, f32> {
    let mut weights = HashMap::new();

    for item in weights_str.split(',') {
        let item = item.trim();
        if let Some((source, weight)) = item.split_once(':') {
            if let Ok(weight) = weight.trim().parse::<f32>() {
                weights.insert(source.trim().to_string(), weight);
            }
        }
    }

    weights
}

// Default value functions

fn default_sources() -> Vec<String> {
    vec![
        "vector".to_string(),
        "faq".to_string(),
        "keyword".to_string(),
    ]
}

fn default_timeout_ms() -> u64 {
    500
}

fn default_retry() -> u32 {
    1
}

fn default_degrade_threshold() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}
