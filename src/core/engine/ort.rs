//! ONNX Runtime implementation of the engine contract.
//!
//! Adapts an `.onnx` classification model to [`InferenceEngine`]. The model
//! must declare an NHWC input `[1, H, W, C]` (a dynamic batch dimension
//! resolves to 1) with f32 or u8 element type; anything else is rejected at
//! load time rather than at the first inference.

use super::{
    ElementType, EngineLoader, InferenceEngine, NumericTensor, OutputTree, TensorData, TensorShape,
};
use crate::error::EngineError;
use ndarray::ArrayD;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use ort::value::{TensorRef, ValueType};
use std::path::{Path, PathBuf};
use tracing::info;

/// Loads an ONNX model from disk.
pub struct OrtLoader {
    model_path: PathBuf,
}

impl OrtLoader {
    /// Loader for the model file at `path`. Nothing is read until `load`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            model_path: path.as_ref().to_path_buf(),
        }
    }
}

impl EngineLoader for OrtLoader {
    type Engine = OrtEngine;

    fn load(&mut self) -> Result<OrtEngine, EngineError> {
        // Initialize the ORT environment (idempotent)
        let _ = ort::init().commit();

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(4))
            .and_then(|b| b.commit_from_file(&self.model_path))
            .map_err(|e| EngineError::Load {
                reason: e.to_string(),
            })?;

        let engine = OrtEngine::from_session(session)?;
        info!(
            model = %self.model_path.display(),
            input_shape = %engine.input_shape,
            output_shape = %engine.output_shape,
            input_type = %engine.input_type,
            "ONNX model loaded"
        );
        Ok(engine)
    }
}

/// A loaded ONNX Runtime session speaking the engine contract.
pub struct OrtEngine {
    session: Session,
    input_name: String,
    output_name: String,
    input_shape: TensorShape,
    output_shape: TensorShape,
    input_type: ElementType,
}

impl OrtEngine {
    fn from_session(session: Session) -> Result<Self, EngineError> {
        let input = session
            .inputs()
            .first()
            .ok_or_else(|| EngineError::UnsupportedModel {
                reason: "model declares no inputs".to_string(),
            })?;
        let output = session
            .outputs()
            .first()
            .ok_or_else(|| EngineError::UnsupportedModel {
                reason: "model declares no outputs".to_string(),
            })?;

        let input_name = input.name().to_string();
        let output_name = output.name().to_string();

        let (input_type, input_dims) = tensor_metadata(input.dtype(), &input_name)?;
        let (_, output_dims) = tensor_metadata(output.dtype(), &output_name)?;

        let input_type = match input_type {
            TensorElementType::Float32 => ElementType::Float32,
            TensorElementType::Uint8 => ElementType::Uint8,
            other => {
                return Err(EngineError::UnsupportedModel {
                    reason: format!("input element type {other:?} is neither f32 nor u8"),
                })
            }
        };

        let input_shape = resolve_input_shape(&input_dims)?;
        // Output dims only describe the batch structure; a dynamic batch
        // resolves to 1 the same way the input's does
        let output_shape = TensorShape::new(
            output_dims
                .iter()
                .map(|&d| if d > 0 { d as usize } else { 1 })
                .collect(),
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            input_shape,
            output_shape,
            input_type,
        })
    }

    fn run_session(
        &mut self,
        input: &NumericTensor,
    ) -> Result<(Vec<usize>, Vec<f32>), EngineError> {
        let dims = input.shape().dims().to_vec();
        let input_name = self.input_name.clone();
        let output_name = self.output_name.clone();
        let inference = |e: ort::Error| EngineError::Inference {
            reason: e.to_string(),
        };

        match input.data() {
            TensorData::Float32(values) => {
                let array = ArrayD::from_shape_vec(dims, values.clone()).map_err(|e| {
                    EngineError::Inference {
                        reason: e.to_string(),
                    }
                })?;
                let tensor = TensorRef::from_array_view(array.view()).map_err(inference)?;
                let outputs = self
                    .session
                    .run(ort::inputs![input_name.as_str() => tensor])
                    .map_err(inference)?;
                extract_output(&outputs[output_name.as_str()])
            }
            TensorData::Uint8(values) => {
                let array = ArrayD::from_shape_vec(dims, values.clone()).map_err(|e| {
                    EngineError::Inference {
                        reason: e.to_string(),
                    }
                })?;
                let tensor = TensorRef::from_array_view(array.view()).map_err(inference)?;
                let outputs = self
                    .session
                    .run(ort::inputs![input_name.as_str() => tensor])
                    .map_err(inference)?;
                extract_output(&outputs[output_name.as_str()])
            }
        }
    }
}

/// Pull the output tensor out as f32. Classification outputs are f32;
/// quantized models may report u8, widened here so the rest of the
/// pipeline sees one numeric type.
fn extract_output(value: &ort::value::DynValue) -> Result<(Vec<usize>, Vec<f32>), EngineError> {
    match value.try_extract_tensor::<f32>() {
        Ok((shape, data)) => Ok((
            shape.iter().map(|&d| d.max(0) as usize).collect(),
            data.to_vec(),
        )),
        Err(_) => {
            let (shape, data) =
                value
                    .try_extract_tensor::<u8>()
                    .map_err(|e| EngineError::Inference {
                        reason: format!("output is neither f32 nor u8: {e}"),
                    })?;
            Ok((
                shape.iter().map(|&d| d.max(0) as usize).collect(),
                data.iter().map(|&b| f32::from(b)).collect(),
            ))
        }
    }
}

impl InferenceEngine for OrtEngine {
    fn input_shape(&self) -> TensorShape {
        self.input_shape.clone()
    }

    fn output_shape(&self) -> TensorShape {
        self.output_shape.clone()
    }

    fn input_element_type(&self) -> ElementType {
        self.input_type
    }

    fn run(&mut self, input: &NumericTensor) -> Result<OutputTree, EngineError> {
        let (dims, data) = self.run_session(input)?;
        Ok(nest(&dims, &data))
    }
}

/// Element type and declared dimensions of a tensor-valued session input
/// or output. Dynamic dimensions come back as -1.
fn tensor_metadata(
    value_type: &ValueType,
    name: &str,
) -> Result<(TensorElementType, Vec<i64>), EngineError> {
    match value_type {
        ValueType::Tensor { ty, shape, .. } => Ok((*ty, shape.iter().copied().collect())),
        other => Err(EngineError::UnsupportedModel {
            reason: format!("'{name}' is not a tensor: {other:?}"),
        }),
    }
}

/// Validate a declared NHWC input shape, resolving a dynamic batch to 1.
fn resolve_input_shape(dims: &[i64]) -> Result<TensorShape, EngineError> {
    if dims.len() != 4 {
        return Err(EngineError::UnsupportedModel {
            reason: format!("expected rank-4 [1, H, W, C] input, got rank {}", dims.len()),
        });
    }

    let batch = match dims[0] {
        d if d <= 0 => 1,
        1 => 1,
        d => {
            return Err(EngineError::UnsupportedModel {
                reason: format!("batch dimension must be 1, got {d}"),
            })
        }
    };

    let mut resolved = vec![batch];
    for &d in &dims[1..] {
        if d <= 0 {
            return Err(EngineError::UnsupportedModel {
                reason: "height, width and channel dimensions must be static".to_string(),
            });
        }
        resolved.push(d as usize);
    }

    Ok(TensorShape::new(resolved))
}

/// Rebuild the nesting the output shape describes from a flat buffer.
fn nest(dims: &[usize], data: &[f32]) -> OutputTree {
    if dims.len() <= 1 {
        return OutputTree::Values(data.to_vec());
    }

    let inner: usize = dims[1..].iter().product();
    if inner == 0 || dims[0] == 0 {
        return OutputTree::Nested(Vec::new());
    }

    OutputTree::Nested(
        data.chunks(inner)
            .take(dims[0])
            .map(|chunk| nest(&dims[1..], chunk))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_accepts_static_nhwc() {
        let shape = resolve_input_shape(&[1, 224, 224, 3]).unwrap();
        assert_eq!(shape.dims(), &[1, 224, 224, 3]);
    }

    #[test]
    fn resolve_fixes_dynamic_batch_to_one() {
        let shape = resolve_input_shape(&[-1, 128, 128, 3]).unwrap();
        assert_eq!(shape.dims(), &[1, 128, 128, 3]);
    }

    #[test]
    fn resolve_rejects_multi_batch() {
        assert!(resolve_input_shape(&[8, 224, 224, 3]).is_err());
    }

    #[test]
    fn resolve_rejects_dynamic_spatial_dims() {
        assert!(resolve_input_shape(&[1, -1, 224, 3]).is_err());
    }

    #[test]
    fn resolve_rejects_wrong_rank() {
        assert!(resolve_input_shape(&[224, 224, 3]).is_err());
    }

    #[test]
    fn nest_rank_one_is_flat() {
        let tree = nest(&[3], &[1.0, 2.0, 3.0]);
        assert_eq!(tree, OutputTree::Values(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn nest_rank_two_mirrors_batch_rows() {
        let tree = nest(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            tree,
            OutputTree::Nested(vec![
                OutputTree::Values(vec![1.0, 2.0]),
                OutputTree::Values(vec![3.0, 4.0]),
            ])
        );
    }
}
