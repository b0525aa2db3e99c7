//! Tensor types shared between the engine contract and the pipeline.

use std::fmt;

/// Ordered dimensions of a tensor, conventionally `[batch, height, width, channels]`
/// for model inputs.
///
/// Obtained once from the loaded engine and cached for the lifetime of the
/// loaded model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape(Vec<usize>);

impl TensorShape {
    /// Create a shape from its dimensions
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    /// The dimensions in order
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements a tensor of this shape holds
    pub fn element_count(&self) -> usize {
        self.0.iter().product()
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, dim) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", dim)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for TensorShape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Element type an engine requires for its input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// 32-bit floats in [0, 1]
    Float32,
    /// Unsigned 8-bit samples in [0, 255] (quantized models)
    Uint8,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Float32 => write!(f, "f32"),
            ElementType::Uint8 => write!(f, "u8"),
        }
    }
}

/// A flat, row-major sample buffer with its shape and element type.
///
/// The buffer length always equals the shape's element count.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTensor {
    shape: TensorShape,
    data: TensorData,
}

/// The sample buffer of a [`NumericTensor`]
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float32(Vec<f32>),
    Uint8(Vec<u8>),
}

impl NumericTensor {
    /// Create a float tensor. The buffer must match the shape's element count.
    pub fn from_f32(shape: TensorShape, data: Vec<f32>) -> Self {
        debug_assert_eq!(shape.element_count(), data.len());
        Self {
            shape,
            data: TensorData::Float32(data),
        }
    }

    /// Create a quantized tensor. The buffer must match the shape's element count.
    pub fn from_u8(shape: TensorShape, data: Vec<u8>) -> Self {
        debug_assert_eq!(shape.element_count(), data.len());
        Self {
            shape,
            data: TensorData::Uint8(data),
        }
    }

    /// The tensor's shape
    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    /// The element type of the buffer
    pub fn element_type(&self) -> ElementType {
        match self.data {
            TensorData::Float32(_) => ElementType::Float32,
            TensorData::Uint8(_) => ElementType::Uint8,
        }
    }

    /// Number of samples in the buffer
    pub fn len(&self) -> usize {
        match &self.data {
            TensorData::Float32(v) => v.len(),
            TensorData::Uint8(v) => v.len(),
        }
    }

    /// True if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw buffer
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Float samples, if this is a float tensor
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            TensorData::Float32(v) => Some(v),
            TensorData::Uint8(_) => None,
        }
    }

    /// Quantized samples, if this is a u8 tensor
    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.data {
            TensorData::Uint8(v) => Some(v),
            TensorData::Float32(_) => None,
        }
    }
}

/// Output structure returned by an engine run.
///
/// Engines report either a flat sequence of numbers or a structure nested to
/// mirror the output shape (an outer batch level around inner rows). The
/// extractor flattens this by descending into the first element of each
/// nesting level.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTree {
    /// A flat run of numbers - the innermost level
    Values(Vec<f32>),
    /// One nesting level; elements are the slices along the leading dimension
    Nested(Vec<OutputTree>),
}
