//! # Checker Module
//!
//! The caller-facing surface: owns the engine lifecycle and orchestrates
//! preprocess → extract → score → group for whole batches.
//!
//! ## Lifecycle
//! The engine is either `Unloaded` or `Loaded`; every extraction entry
//! point requires the loaded state and fails with
//! [`SimilarityCheckError::NotLoaded`] otherwise. `load_model` is
//! idempotent, `close` drops the engine and returns to `Unloaded`.
//!
//! Extraction takes `&mut self`: a loaded engine is not safe for
//! concurrent invocation, so exclusivity is enforced by the borrow
//! checker rather than documentation.

use crate::core::comparator::{
    find_similar_pairs_with_events, SimilarityReport, TransitiveGrouper, DEFAULT_THRESHOLD,
};
use crate::core::embedding::{Embedding, EmbeddingExtractor};
use crate::core::engine::{EngineLoader, InferenceEngine, LoadedEngine};
use crate::core::preprocess::Preprocessor;
use crate::error::{Result, SimilarityCheckError};
use crate::events::{CompareEvent, Event, EventSender, ExtractEvent, ExtractProgress, null_sender};
use tracing::{debug, info};

/// Two-state engine lifecycle
enum EngineState<E: InferenceEngine> {
    Unloaded,
    Loaded(LoadedEngine<E>),
}

/// Compares images for visual similarity through a classification network.
///
/// Generic over the [`EngineLoader`] so model resolution stays outside the
/// core: production hands in an ONNX Runtime loader, tests hand in
/// scripted fakes through the same seam.
pub struct SimilarityChecker<L: EngineLoader> {
    loader: L,
    preprocessor: Preprocessor,
    state: EngineState<L::Engine>,
}

impl<L: EngineLoader> SimilarityChecker<L> {
    /// Create an unloaded checker around a configured loader.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            preprocessor: Preprocessor::new(),
            state: EngineState::Unloaded,
        }
    }

    /// Load the model. Calling again while loaded is a no-op.
    pub fn load_model(&mut self) -> Result<()> {
        if matches!(self.state, EngineState::Loaded(_)) {
            debug!("load_model called while already loaded; ignoring");
            return Ok(());
        }

        let engine = self.loader.load()?;
        let loaded = LoadedEngine::new(engine);
        info!(
            input_shape = %loaded.input_shape(),
            output_shape = %loaded.output_shape(),
            input_type = %loaded.input_element_type(),
            "model loaded"
        );
        self.state = EngineState::Loaded(loaded);
        Ok(())
    }

    /// Release the engine and return to the unloaded state.
    pub fn close(&mut self) {
        if matches!(self.state, EngineState::Loaded(_)) {
            info!("engine released");
        }
        self.state = EngineState::Unloaded;
    }

    /// True if a model is currently loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, EngineState::Loaded(_))
    }

    /// Extract the embedding for one image.
    pub fn extract_embedding(&mut self, image: &[u8]) -> Result<Embedding> {
        let engine = match &mut self.state {
            EngineState::Loaded(engine) => engine,
            EngineState::Unloaded => return Err(SimilarityCheckError::NotLoaded),
        };

        let tensor = self.preprocessor.preprocess(image, engine.input_shape())?;
        let embedding = EmbeddingExtractor::extract(engine, &tensor)?;
        debug!(dimensions = embedding.len(), "embedding extracted");
        Ok(embedding)
    }

    /// Similarity score between two images, in `[0, 1]`.
    pub fn get_similarity(&mut self, image_a: &[u8], image_b: &[u8]) -> Result<f64> {
        let a = self.extract_embedding(image_a)?;
        let b = self.extract_embedding(image_b)?;
        Ok(a.similarity_score(&b)?)
    }

    /// Find all similar pairs and transitive groups in a batch.
    ///
    /// Fewer than 2 images yields an empty report without touching the
    /// engine. Fail-fast: the first extraction or scoring error aborts the
    /// whole call and discards any embeddings computed so far.
    pub fn find_similar_images(
        &mut self,
        images: &[impl AsRef<[u8]>],
        threshold: f64,
    ) -> Result<SimilarityReport> {
        self.find_similar_images_with_events(images, threshold, &null_sender())
    }

    /// Same as [`find_similar_images`](Self::find_similar_images), emitting
    /// progress events for each phase.
    pub fn find_similar_images_with_events(
        &mut self,
        images: &[impl AsRef<[u8]>],
        threshold: f64,
        events: &EventSender,
    ) -> Result<SimilarityReport> {
        if images.len() < 2 {
            return Ok(SimilarityReport::empty());
        }

        events.send(Event::Extract(ExtractEvent::Started {
            total_images: images.len(),
        }));

        let mut embeddings = Vec::with_capacity(images.len());
        for (completed, image) in images.iter().enumerate() {
            embeddings.push(self.extract_embedding(image.as_ref())?);
            events.send(Event::Extract(ExtractEvent::Progress(ExtractProgress {
                completed: completed + 1,
                total: images.len(),
            })));
        }

        events.send(Event::Extract(ExtractEvent::Completed {
            total_extracted: embeddings.len(),
        }));

        let pairs = find_similar_pairs_with_events(&embeddings, threshold, events)
            .map_err(SimilarityCheckError::from)?;
        let groups = TransitiveGrouper::new().group(images.len(), &pairs);

        events.send(Event::Compare(CompareEvent::Completed {
            pairs_found: pairs.len(),
            groups_found: groups.len(),
        }));
        info!(
            images = images.len(),
            threshold,
            pairs = pairs.len(),
            groups = groups.len(),
            "batch comparison complete"
        );

        Ok(SimilarityReport { pairs, groups })
    }

    /// [`find_similar_images`](Self::find_similar_images) at the default
    /// threshold of 0.95.
    pub fn find_similar_images_default(
        &mut self,
        images: &[impl AsRef<[u8]>],
    ) -> Result<SimilarityReport> {
        self.find_similar_images(images, DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::testing::{FakeEngine, FakeLoader};
    use crate::core::engine::ElementType;
    use crate::error::PreprocessError;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::io::Cursor;

    fn png_bytes(value: u8) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(2, 2, Rgb([value, value, value]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn checker_with(embeddings: Vec<Vec<f32>>) -> SimilarityChecker<FakeLoader> {
        SimilarityChecker::new(FakeLoader::new(FakeEngine::with_embeddings(embeddings)))
    }

    #[test]
    fn starts_unloaded() {
        let checker = checker_with(vec![]);
        assert!(!checker.is_loaded());
    }

    #[test]
    fn load_transitions_to_loaded() {
        let mut checker = checker_with(vec![]);
        checker.load_model().unwrap();
        assert!(checker.is_loaded());
    }

    #[test]
    fn load_is_idempotent() {
        let mut checker = checker_with(vec![]);
        checker.load_model().unwrap();
        // Second load must not consume the loader again
        checker.load_model().unwrap();
        assert!(checker.is_loaded());
    }

    #[test]
    fn close_returns_to_unloaded() {
        let mut checker = checker_with(vec![]);
        checker.load_model().unwrap();
        checker.close();
        assert!(!checker.is_loaded());
    }

    #[test]
    fn extraction_before_load_fails() {
        let mut checker = checker_with(vec![vec![1.0]]);
        let result = checker.extract_embedding(&png_bytes(10));
        assert!(matches!(result, Err(SimilarityCheckError::NotLoaded)));
    }

    #[test]
    fn get_similarity_before_load_fails() {
        let mut checker = checker_with(vec![vec![1.0], vec![1.0]]);
        let result = checker.get_similarity(&png_bytes(1), &png_bytes(2));
        assert!(matches!(result, Err(SimilarityCheckError::NotLoaded)));
    }

    #[test]
    fn identical_embeddings_score_one() {
        let mut checker = checker_with(vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]]);
        checker.load_model().unwrap();

        let score = checker.get_similarity(&png_bytes(1), &png_bytes(2)).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_images_is_an_empty_report() {
        // Succeeds without a loaded engine: there is nothing to extract
        let mut checker = checker_with(vec![]);

        let images: Vec<Vec<u8>> = vec![];
        let report = checker.find_similar_images(&images, 0.95).unwrap();
        assert!(report.pairs.is_empty());
        assert!(report.groups.is_empty());

        let report = checker
            .find_similar_images(&[png_bytes(1)], 0.95)
            .unwrap();
        assert!(report.pairs.is_empty());
        assert!(report.groups.is_empty());
    }

    #[test]
    fn batch_pairs_and_groups_follow_scores() {
        // Embeddings with pairwise cosines: (0,1) high, others low
        let mut checker = checker_with(vec![
            vec![1.0, 0.0],
            vec![1.0, 0.05],
            vec![-1.0, 1.0],
        ]);
        checker.load_model().unwrap();

        let images = vec![png_bytes(1), png_bytes(2), png_bytes(3)];
        let report = checker.find_similar_images(&images, 0.95).unwrap();

        assert_eq!(report.pairs.len(), 1);
        assert_eq!(
            (report.pairs[0].index_a, report.pairs[0].index_b),
            (0, 1)
        );
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].members, vec![0, 1]);
    }

    #[test]
    fn undecodable_image_fails_the_whole_batch() {
        let mut checker = checker_with(vec![vec![1.0], vec![1.0], vec![1.0]]);
        checker.load_model().unwrap();

        let images = vec![png_bytes(1), vec![0xDE, 0xAD], png_bytes(3)];
        let result = checker.find_similar_images(&images, 0.95);

        assert!(matches!(
            result,
            Err(SimilarityCheckError::Preprocess(PreprocessError::Decode { .. }))
        ));
    }

    #[test]
    fn quantized_engine_gets_u8_input() {
        let loader = FakeLoader::new(
            FakeEngine::with_embeddings(vec![vec![1.0, 0.0]]).quantized(),
        );
        let mut checker = SimilarityChecker::new(loader);
        checker.load_model().unwrap();

        checker.extract_embedding(&png_bytes(128)).unwrap();
        // The fake records what it saw; reach in through the state
        match &checker.state {
            EngineState::Loaded(loaded) => {
                let seen = &loaded.engine_for_tests().seen_inputs;
                assert_eq!(seen.len(), 1);
                assert_eq!(seen[0].element_type(), ElementType::Uint8);
                assert!(seen[0].as_u8().unwrap().iter().all(|&b| b == 128));
            }
            EngineState::Unloaded => panic!("engine should be loaded"),
        }
    }

    #[test]
    fn events_cover_both_phases() {
        use crate::events::EventChannel;

        let mut checker = checker_with(vec![vec![1.0, 0.0], vec![1.0, 0.0]]);
        checker.load_model().unwrap();

        let (sender, receiver) = EventChannel::new();
        let images = vec![png_bytes(1), png_bytes(2)];
        checker
            .find_similar_images_with_events(&images, 0.95, &sender)
            .unwrap();
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert!(matches!(
            events.first(),
            Some(Event::Extract(ExtractEvent::Started { total_images: 2 }))
        ));
        assert!(matches!(
            events.last(),
            Some(Event::Compare(CompareEvent::Completed {
                pairs_found: 1,
                groups_found: 1,
            }))
        ));
    }
}
