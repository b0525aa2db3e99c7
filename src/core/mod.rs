//! # Core Module
//!
//! The UI-agnostic similarity engine.
//!
//! ## Modules
//! - `preprocess` - Decodes and resizes images into engine input tensors
//! - `engine` - The inference-engine contract and the ONNX Runtime adapter
//! - `embedding` - Extracts flat feature vectors from engine output
//! - `scorer` - Cosine similarity between embeddings
//! - `comparator` - Pairwise comparison and transitive grouping
//! - `checker` - The caller-facing surface tying it all together
//!
//! Data flows strictly upward: raw bytes → tensor → vector → pairwise
//! scores → pairs and groups.

pub mod checker;
pub mod comparator;
pub mod embedding;
pub mod engine;
pub mod preprocess;
pub mod scorer;

// Re-export commonly used types
pub use checker::SimilarityChecker;
pub use comparator::{SimilarPair, SimilarityGroup, SimilarityReport, DEFAULT_THRESHOLD};
pub use embedding::Embedding;
pub use engine::{EngineLoader, InferenceEngine, TensorShape};
