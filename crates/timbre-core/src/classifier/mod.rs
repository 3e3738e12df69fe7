//! Genre classifier
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  shared() / SharedClassifier                 │
//! │  • loads the model at most once per process  │
//! │  • caches a load failure (no retries)        │
//! └──────────────────────────────────────────────┘
//!                       │ Arc<Classifier>
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │  Classifier                                  │
//! │  • checks input shape                        │
//! │  • validates output distribution             │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │  GenreModel (trait)                          │
//! │  • OnnxGenreModel (ONNX Runtime)             │
//! └──────────────────────────────────────────────┘
//! ```

mod onnx;
mod shared;

pub use onnx::OnnxGenreModel;
pub use shared::{configure, shared, SharedClassifier};

use crate::error::{ClassifyError, Result};
use crate::features::{FeatureTensor, FEATURE_SHAPE};
use crate::prediction::Prediction;

/// A pretrained network mapping a feature tensor to raw class scores
///
/// Implementations must be usable from several threads at once and must not
/// mutate their weights while predicting.
pub trait GenreModel: Send + Sync {
    /// Run one forward pass, returning the output vector unchanged
    fn predict(&self, input: &FeatureTensor) -> Result<Vec<f32>>;

    /// Human-readable backend name for logging
    fn name(&self) -> &str;
}

/// Wraps a [`GenreModel`] and turns its output into a [`Prediction`]
pub struct Classifier {
    model: Box<dyn GenreModel>,
}

impl Classifier {
    pub fn new(model: impl GenreModel + 'static) -> Self {
        Self {
            model: Box::new(model),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Classify one feature tensor.
    ///
    /// The model's final layer already produces a probability distribution,
    /// so its output is only validated, never rescaled.
    pub fn classify(&self, input: &FeatureTensor) -> Result<Prediction> {
        if input.shape() != FEATURE_SHAPE {
            return Err(ClassifyError::Inference(format!(
                "Input shape {:?} does not match model input {:?}",
                input.shape(),
                FEATURE_SHAPE
            )));
        }

        let raw = self.model.predict(input)?;
        log::debug!("{} output: {:?}", self.model.name(), raw);
        Prediction::from_probabilities(&raw)
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("model", &self.model.name())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic stand-in models for pipeline tests

    use super::*;
    use crate::genre::GENRE_COUNT;

    /// Softmax over a fixed score vector shifted by the input's mean energy
    pub struct StubModel {
        pub scores: [f32; GENRE_COUNT],
    }

    impl GenreModel for StubModel {
        fn predict(&self, input: &FeatureTensor) -> Result<Vec<f32>> {
            let data = input.as_array();
            let mean = data.iter().sum::<f32>() / data.len() as f32;
            let logits: Vec<f32> = self
                .scores
                .iter()
                .enumerate()
                .map(|(i, s)| s + mean * i as f32)
                .collect();
            let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
            let total: f32 = exps.iter().sum();
            Ok(exps.into_iter().map(|e| e / total).collect())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Returns a fixed vector, valid or not
    pub struct FixedModel(pub Vec<f32>);

    impl GenreModel for FixedModel {
        fn predict(&self, _input: &FeatureTensor) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Always fails the forward pass
    pub struct FailingModel;

    impl GenreModel for FailingModel {
        fn predict(&self, _input: &FeatureTensor) -> Result<Vec<f32>> {
            Err(ClassifyError::Inference("forward pass failed".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    pub fn stub_classifier() -> Classifier {
        Classifier::new(StubModel {
            scores: [0.3, 0.1, -0.2, 0.0, 0.4, 0.2, -0.1, 0.5, 0.0, 0.1],
        })
    }
}
