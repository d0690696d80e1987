//! recall-sources - Reference retrieval sources
//!
//! This crate provides the reference [`RecallSource`] implementations
//! consumed by the recall engine:
//!
//! - [`FaqSource`]: curated question/answer corpus matched by term and
//!   keyword overlap.
//! - [`KeywordSource`]: rule library matched by keywords, regex patterns,
//!   and a synonym table.
//! - [`VectorSource`]: embedding similarity over a pluggable vector index.
//!
//! [`MockEmbedder`] and [`MemoryIndex`] make the vector path exercisable
//! without a real model or index backend.

mod faq;
mod keyword;
mod mock;
mod vector;

pub use faq::{FaqEntry, FaqSource};
pub use keyword::{KeywordRule, KeywordRuleSet, KeywordSource};
pub use mock::{MemoryIndex, MockEmbedder};
pub use vector::VectorSource;

// Re-export the source trait for convenience
pub use recall_core::RecallSource;
