//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};

/// All events emitted by the similarity checker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Embedding extraction phase events
    Extract(ExtractEvent),
    /// Pairwise comparison phase events
    Compare(CompareEvent),
}

/// Events during the embedding extraction phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractEvent {
    /// Extraction has started
    Started { total_images: usize },
    /// Progress update during extraction
    Progress(ExtractProgress),
    /// Extraction completed
    Completed { total_extracted: usize },
}

/// Progress information during embedding extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractProgress {
    /// Number of images embedded so far
    pub completed: usize,
    /// Total number of images to embed
    pub total: usize,
}

/// Events during the pairwise comparison phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started { total_comparisons: usize },
    /// Progress update during comparison
    Progress(CompareProgress),
    /// Comparison completed
    Completed {
        pairs_found: usize,
        groups_found: usize,
    },
}

/// Progress information during pairwise comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Number of comparisons completed
    pub comparisons_completed: usize,
    /// Total number of comparisons needed
    pub total_comparisons: usize,
    /// Number of similar pairs found so far
    pub pairs_found: usize,
}
