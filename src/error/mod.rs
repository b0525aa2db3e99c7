//! # Error Module
//!
//! Typed errors for the similarity checker.
//!
//! ## Design Principles
//! - **Never panic** on caller data - return errors instead
//! - **Include context** - shapes, lengths, what went wrong
//! - **Fail fast** - no retries or partial results anywhere in the core;
//!   every failure aborts the in-progress operation and is surfaced here

use crate::core::engine::TensorShape;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for the similarity checker
#[derive(Error, Debug)]
pub enum SimilarityCheckError {
    #[error("Preprocessing error: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("Inference engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Scoring error: {0}")]
    Score(#[from] ScoreError),

    #[error("Model is not loaded. Call load_model() first.")]
    NotLoaded,

    #[error("Failed to read image file {path}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while turning raw image bytes into an input tensor
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Failed to decode image: {reason}")]
    Decode { reason: String },

    #[error("Unsupported input shape {shape}: {reason}")]
    UnsupportedShape { shape: TensorShape, reason: String },

    #[error("Failed to resize image to {width}x{height}: {reason}")]
    Resize {
        width: u32,
        height: u32,
        reason: String,
    },
}

/// Errors from the inference engine collaborator
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to load model: {reason}")]
    Load { reason: String },

    #[error("Model is not usable for embedding extraction: {reason}")]
    UnsupportedModel { reason: String },

    #[error("Inference failed: {reason}")]
    Inference { reason: String },

    #[error("Engine returned an empty output structure")]
    EmptyOutput,
}

/// Errors that occur while scoring two embeddings
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Embedding lengths do not match: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SimilarityCheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_includes_reason() {
        let error = PreprocessError::Decode {
            reason: "not a PNG".to_string(),
        };
        assert!(error.to_string().contains("not a PNG"));
    }

    #[test]
    fn shape_error_includes_shape() {
        let error = PreprocessError::UnsupportedShape {
            shape: TensorShape::new(vec![1, 224, 224, 5]),
            reason: "channel count must be 1 or 3".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("[1, 224, 224, 5]"));
        assert!(message.contains("channel count"));
    }

    #[test]
    fn dimension_mismatch_includes_both_lengths() {
        let error = ScoreError::DimensionMismatch {
            left: 1001,
            right: 1000,
        };
        let message = error.to_string();
        assert!(message.contains("1001"));
        assert!(message.contains("1000"));
    }

    #[test]
    fn not_loaded_suggests_recovery() {
        let error = SimilarityCheckError::NotLoaded;
        assert!(error.to_string().contains("load_model()"));
    }

    #[test]
    fn stage_errors_convert_to_top_level() {
        let error: SimilarityCheckError = EngineError::EmptyOutput.into();
        assert!(matches!(error, SimilarityCheckError::Engine(_)));
    }
}
