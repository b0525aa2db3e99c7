//! # Embedding Module
//!
//! Runs a preprocessed tensor through the engine and normalizes whatever
//! comes back into one flat feature vector.
//!
//! ## How It Works
//! 1. Retype the float tensor to `u8` if the engine wants quantized input
//! 2. Run the engine
//! 3. Flatten the output structure by always taking the first element of
//!    each nesting level (drops all batch rows beyond the first)
//!
//! The network is a classifier used as-is; its activations serve as a
//! similarity proxy, not a validated embedding space.

use crate::core::engine::{
    ElementType, InferenceEngine, LoadedEngine, NumericTensor, OutputTree,
};
use crate::core::scorer;
use crate::error::{EngineError, ScoreError};

/// A fixed-length feature vector extracted from one image
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    pub(crate) fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cosine similarity against another embedding, in `[-1, 1]`
    pub fn cosine_similarity(&self, other: &Embedding) -> Result<f64, ScoreError> {
        scorer::cosine_similarity(&self.values, &other.values)
    }

    /// Bounded similarity score against another embedding, in `[0, 1]`
    pub fn similarity_score(&self, other: &Embedding) -> Result<f64, ScoreError> {
        scorer::similarity_score(&self.values, &other.values)
    }
}

/// Drives one inference pass and flattens the result.
pub struct EmbeddingExtractor;

impl EmbeddingExtractor {
    /// Run `input` through the engine and flatten its output into an
    /// [`Embedding`]. The input tensor is retyped to match the engine's
    /// element type first.
    pub(crate) fn extract<E: InferenceEngine>(
        engine: &mut LoadedEngine<E>,
        input: &NumericTensor,
    ) -> Result<Embedding, EngineError> {
        let output = match (engine.input_element_type(), input.as_f32()) {
            (ElementType::Uint8, Some(values)) => {
                let quantized =
                    NumericTensor::from_u8(input.shape().clone(), quantize_to_u8(values));
                engine.run(&quantized)?
            }
            _ => engine.run(input)?,
        };

        let values = first_leaf(&output)?.to_vec();
        Ok(Embedding::new(values))
    }
}

/// Convert `[0, 1]` floats to `u8` by clamping, scaling by 255 and rounding
/// to the nearest integer with ties away from zero (`f32::round`), so
/// `0.5` maps to `128`. The rounding rule is part of the contract: scores
/// are only reproducible bit-for-bit if every caller quantizes the same way.
fn quantize_to_u8(values: &[f32]) -> Vec<u8> {
    values
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}

/// Descend into the first element of each nesting level until a flat run
/// of numbers is reached. `Nested([])` has nothing to descend into.
fn first_leaf(tree: &OutputTree) -> Result<&[f32], EngineError> {
    match tree {
        OutputTree::Values(values) => Ok(values),
        OutputTree::Nested(children) => children
            .first()
            .ok_or(EngineError::EmptyOutput)
            .and_then(first_leaf),
    }
}
