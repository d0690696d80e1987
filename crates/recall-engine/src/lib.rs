//! recall-engine - Recall orchestration pipeline
//!
//! This crate blends several independent retrieval sources into one
//! ranked, deduplicated, confidence-scored result set with graceful
//! degradation when signal quality is poor.
//!
//! # Pipeline
//!
//! Configuration resolution → concurrent fan-out → weighted merge →
//! degradation policy → result assembly. Each stage consumes only the
//! previous stage's output plus the resolved configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use recall_core::{RecallConfig, RecallRequest};
//! use recall_engine::RecallEngine;
//! use std::sync::Arc;
//!
//! let engine = RecallEngine::new(RecallConfig::default())
//!     .register(Arc::new(faq_source))
//!     .register(Arc::new(keyword_source));
//! let result = engine.invoke(RecallRequest::new("refund policy", "session-1")).await;
//! ```

mod degrade;
mod dispatch;
mod engine;
mod merge;

pub use degrade::{apply_degradation, FALLBACK_SCORE};
pub use dispatch::fan_out;
pub use engine::RecallEngine;
pub use merge::merge_hits;

// Re-export for convenience
pub use recall_core::{RecallHit, RecallRequest, RecallResult};
