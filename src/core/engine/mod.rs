//! # Engine Module
//!
//! The inference-engine contract.
//!
//! The core never constructs or manages a network's weights or graph. It
//! talks to an engine through two seams:
//! - [`EngineLoader`] - turns an already-resolved model into a running engine
//! - [`InferenceEngine`] - a loaded engine with fixed input/output shapes
//!
//! Which model file to load, and any fallback between candidate locations,
//! is the caller's business; the loader is handed in fully configured.
//!
//! ## Backends
//! With the `ort-backend` feature (on by default) the [`ort`] module adapts
//! ONNX Runtime to this contract. Tests script their own engines instead.

mod types;

#[cfg(feature = "ort-backend")]
pub mod ort;

pub use types::{ElementType, NumericTensor, OutputTree, TensorData, TensorShape};

use crate::error::EngineError;

/// A loaded inference engine: an opaque function from an input tensor to an
/// output structure, with fixed shapes.
///
/// Engines are not safe for concurrent invocation; `run` takes `&mut self`
/// so exclusive use is enforced by the borrow checker. Releasing the
/// engine's resources happens on drop.
pub trait InferenceEngine {
    /// The input shape the engine expects, conventionally `[1, H, W, C]`
    fn input_shape(&self) -> TensorShape;

    /// The shape of the engine's output
    fn output_shape(&self) -> TensorShape;

    /// The element type the engine requires for its input buffer
    fn input_element_type(&self) -> ElementType;

    /// Run one inference pass. The input tensor matches `input_shape` and
    /// `input_element_type`.
    fn run(&mut self, input: &NumericTensor) -> Result<OutputTree, EngineError>;
}

/// Loads a model and yields a ready-to-run engine.
pub trait EngineLoader {
    type Engine: InferenceEngine;

    /// Load the model this loader was configured with
    fn load(&mut self) -> Result<Self::Engine, EngineError>;
}

/// An engine together with its metadata, queried once at load time and
/// cached for the lifetime of the loaded model.
pub(crate) struct LoadedEngine<E: InferenceEngine> {
    engine: E,
    input_shape: TensorShape,
    output_shape: TensorShape,
    input_type: ElementType,
}

impl<E: InferenceEngine> LoadedEngine<E> {
    pub(crate) fn new(engine: E) -> Self {
        let input_shape = engine.input_shape();
        let output_shape = engine.output_shape();
        let input_type = engine.input_element_type();
        Self {
            engine,
            input_shape,
            output_shape,
            input_type,
        }
    }

    pub(crate) fn input_shape(&self) -> &TensorShape {
        &self.input_shape
    }

    pub(crate) fn output_shape(&self) -> &TensorShape {
        &self.output_shape
    }

    pub(crate) fn input_element_type(&self) -> ElementType {
        self.input_type
    }

    pub(crate) fn run(&mut self, input: &NumericTensor) -> Result<OutputTree, EngineError> {
        self.engine.run(input)
    }

    #[cfg(test)]
    pub(crate) fn engine_for_tests(&self) -> &E {
        &self.engine
    }
}
