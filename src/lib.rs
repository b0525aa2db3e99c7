//! # Similar Image Checker
//!
//! Finds visually similar images by comparing classification-network
//! embeddings with cosine similarity.
//!
//! ## Core Philosophy
//! - **The network is a proxy** - a stock classifier's outputs stand in for
//!   a learned similarity space; no fine-tuning, no embedding persistence
//! - **Deterministic output** - scores, pair order, and group order are
//!   reproducible run to run
//! - **Fail fast** - one bad image fails the whole batch rather than
//!   returning partial results
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation
//! layers:
//! - `core` - The similarity pipeline and engine contract
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - Typed error stack
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::{SimilarPair, SimilarityChecker, SimilarityGroup, SimilarityReport};
pub use error::{Result, SimilarityCheckError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
