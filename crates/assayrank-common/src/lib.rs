//! assayrank-common — Shared types, errors, and configuration used across all assayrank crates.

pub mod assay;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use assay::{AssayType, Relation};
pub use config::{Config, DedupPolicy, UnparsablePolicy};
pub use error::{AssayRankError, Result};
