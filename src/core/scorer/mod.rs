//! # Scorer Module
//!
//! Deterministic vector comparison.
//!
//! Cosine similarity measures angular closeness independent of magnitude,
//! which is what we want: raw classification outputs carry no normalization
//! guarantee, so only their direction is meaningful.
//!
//! The public score remaps cosine's `[-1, 1]` range to `[0, 1]` so higher
//! is always "more similar" and the value reads directly as a percentage.

use crate::error::ScoreError;

/// Cosine similarity of two equal-length vectors, in `[-1, 1]`.
///
/// Accumulates in `f64` so long vectors don't lose precision. If either
/// vector has zero norm the result is `0.0`, not NaN: an all-zero embedding
/// reads as "no signal," neither maximal nor undefined similarity.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, ScoreError> {
    if a.len() != b.len() {
        return Err(ScoreError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    // Rounding can push |cos| marginally past 1 for near-parallel vectors
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Bounded similarity score in `[0, 1]`: `(cosine + 1) / 2`.
pub fn similarity_score(a: &[f32], b: &[f32]) -> Result<f64, ScoreError> {
    Ok((cosine_similarity(a, b)? + 1.0) / 2.0)
}
