//! recall-core - Core types and traits for the recall engine
//!
//! This crate provides the foundational types, traits, error handling,
//! and configuration model used throughout the recall system.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{RecallError, Result};
pub use traits::*;
pub use types::*;
