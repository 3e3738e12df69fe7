//! Interpretation of the classifier output

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, Result};
use crate::genre::{Genre, GENRE_COUNT};

/// Allowed deviation of the probability sum from 1.0
pub const SUM_TOLERANCE: f32 = 1e-3;

/// Probability distribution over [`Genre::ALL`], in label order
///
/// Serialized as a plain list of probabilities; deserializing validates it
/// like [`Prediction::from_probabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Prediction {
    probabilities: [f32; GENRE_COUNT],
}

/// One (genre, probability) pair of a distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenreProbability {
    pub genre: Genre,
    pub probability: f32,
}

/// Plain-data view of a prediction for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub top_genre: Genre,
    /// Probability of the top genre, in percent
    pub confidence_percent: f32,
    /// Full distribution in label order
    pub distribution: Vec<GenreProbability>,
}

impl Prediction {
    /// Validate a raw model output vector.
    ///
    /// The values are kept as-is. A vector of the wrong length, with negative
    /// or non-finite entries, or not summing to 1 within [`SUM_TOLERANCE`] is
    /// an inference error.
    pub fn from_probabilities(values: &[f32]) -> Result<Self> {
        let probabilities: [f32; GENRE_COUNT] = values.try_into().map_err(|_| {
            ClassifyError::Inference(format!(
                "Model produced {} outputs, expected {}",
                values.len(),
                GENRE_COUNT
            ))
        })?;

        if let Some((i, p)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(ClassifyError::Inference(format!(
                "Invalid probability {} for {}",
                p,
                Genre::ALL[i]
            )));
        }

        let sum: f32 = probabilities.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ClassifyError::Inference(format!(
                "Model output is not a probability distribution (sum = {})",
                sum
            )));
        }

        Ok(Self { probabilities })
    }

    pub fn probabilities(&self) -> &[f32; GENRE_COUNT] {
        &self.probabilities
    }

    pub fn probability(&self, genre: Genre) -> f32 {
        self.probabilities[genre.index()]
    }

    /// Arg-max genre and its probability; ties go to the lowest index
    pub fn top(&self) -> (Genre, f32) {
        let mut best = 0;
        for (i, &p) in self.probabilities.iter().enumerate().skip(1) {
            if p > self.probabilities[best] {
                best = i;
            }
        }
        (Genre::ALL[best], self.probabilities[best])
    }

    pub fn top_genre(&self) -> Genre {
        self.top().0
    }

    /// Probability of the top genre, in percent
    pub fn confidence_percent(&self) -> f32 {
        self.top().1 * 100.0
    }

    /// All (genre, probability) pairs in label order
    pub fn distribution(&self) -> impl Iterator<Item = GenreProbability> + '_ {
        Genre::ALL
            .iter()
            .zip(self.probabilities.iter())
            .map(|(&genre, &probability)| GenreProbability { genre, probability })
    }

    /// All pairs, most likely first (stable: ties keep label order)
    pub fn ranked(&self) -> Vec<GenreProbability> {
        let mut pairs: Vec<GenreProbability> = self.distribution().collect();
        pairs.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs
    }

    pub fn summary(&self) -> PredictionSummary {
        PredictionSummary {
            top_genre: self.top_genre(),
            confidence_percent: self.confidence_percent(),
            distribution: self.distribution().collect(),
        }
    }
}

impl TryFrom<Vec<f32>> for Prediction {
    type Error = ClassifyError;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Self::from_probabilities(&values)
    }
}

impl From<Prediction> for Vec<f32> {
    fn from(prediction: Prediction) -> Self {
        prediction.probabilities.to_vec()
    }
}
