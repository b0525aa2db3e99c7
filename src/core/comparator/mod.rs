//! # Comparator Module
//!
//! Finds similar images by comparing their embeddings pairwise.
//!
//! ## How It Works
//! 1. Score every unordered pair of embeddings with cosine similarity
//! 2. Keep pairs at or above the threshold
//! 3. Cluster the qualifying pairs transitively into groups
//!
//! Comparison is quadratic and runs over small in-memory batches; there is
//! no index or approximate-nearest-neighbor shortcut here.

mod grouper;

pub use grouper::TransitiveGrouper;

use crate::core::embedding::Embedding;
use crate::error::ScoreError;
use crate::events::{CompareEvent, CompareProgress, Event, EventSender};
use serde::{Deserialize, Serialize};

/// Default inclusive similarity threshold for batch comparison
pub const DEFAULT_THRESHOLD: f64 = 0.95;

/// One qualifying pair of images from a batch.
///
/// Indices reference positions in the caller-supplied batch, with
/// `index_a < index_b` always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPair {
    /// Batch index of the first image
    pub index_a: usize,
    /// Batch index of the second image
    pub index_b: usize,
    /// Similarity score in [0, 1]
    pub score: f64,
}

/// A cluster of transitively connected batch indices.
///
/// Membership means connected through a chain of above-threshold pairs,
/// not that every member pair scored above the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityGroup {
    /// Batch indices in ascending order; always at least two
    pub members: Vec<usize>,
}

impl SimilarityGroup {
    pub(crate) fn new(members: Vec<usize>) -> Self {
        Self { members }
    }

    /// Number of images in the group
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Pairs and groups produced by one batch comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    /// All pairs scoring at or above the threshold, lexicographic by index
    pub pairs: Vec<SimilarPair>,
    /// Transitive groups, ascending by smallest member
    pub groups: Vec<SimilarityGroup>,
}

impl SimilarityReport {
    /// A report with no pairs and no groups
    pub fn empty() -> Self {
        Self {
            pairs: Vec::new(),
            groups: Vec::new(),
        }
    }
}

/// Score every unordered pair and keep those at or above `threshold`.
///
/// The threshold is an inclusive lower bound: a score exactly equal to it
/// qualifies. Pairs come out lexicographic by `(index_a, index_b)` because
/// that is the iteration order.
pub fn find_similar_pairs(
    embeddings: &[Embedding],
    threshold: f64,
) -> Result<Vec<SimilarPair>, ScoreError> {
    let mut pairs = Vec::new();

    for i in 0..embeddings.len() {
        for j in (i + 1)..embeddings.len() {
            let score = embeddings[i].similarity_score(&embeddings[j])?;
            if score >= threshold {
                pairs.push(SimilarPair {
                    index_a: i,
                    index_b: j,
                    score,
                });
            }
        }
    }

    Ok(pairs)
}

/// Same as [`find_similar_pairs`], emitting progress events at intervals.
pub fn find_similar_pairs_with_events(
    embeddings: &[Embedding],
    threshold: f64,
    events: &EventSender,
) -> Result<Vec<SimilarPair>, ScoreError> {
    let n = embeddings.len();
    let total_comparisons = n.saturating_sub(1) * n / 2;

    events.send(Event::Compare(CompareEvent::Started { total_comparisons }));

    let mut pairs = Vec::new();
    let mut comparisons_completed = 0;
    let mut last_progress_update = 0;

    // Every 1000 comparisons or 2% of the total, whichever is smaller
    let update_interval = std::cmp::min(1000, std::cmp::max(1, total_comparisons / 50));

    for i in 0..n {
        for j in (i + 1)..n {
            let score = embeddings[i].similarity_score(&embeddings[j])?;
            if score >= threshold {
                pairs.push(SimilarPair {
                    index_a: i,
                    index_b: j,
                    score,
                });
            }

            comparisons_completed += 1;
            if comparisons_completed - last_progress_update >= update_interval {
                events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                    comparisons_completed,
                    total_comparisons,
                    pairs_found: pairs.len(),
                })));
                last_progress_update = comparisons_completed;
            }
        }
    }

    Ok(pairs)
}
