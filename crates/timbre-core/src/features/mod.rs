//! Feature extraction: audio signal → fixed-shape model input
//!
//! # Pipeline
//!
//! ```text
//! AudioSignal ──► mel power spectrogram (128 × n_frames)
//!             ──► resize to 100 × 100 (+ channel axis)
//!             ──► batch axis ──► FeatureTensor (1, 100, 100, 1)
//! ```

pub mod mel;
pub mod resize;

pub use mel::{compute_mel_spectrogram, MelSpectrogram, HOP_LENGTH, N_FFT, N_MELS};

use ndarray::{Array2, Array4, Axis};

use crate::audio::AudioSignal;
use crate::error::{ClassifyError, Result};

/// Spatial size (rows, cols) the spectrogram is resized to
pub const TARGET_SIZE: (usize, usize) = (100, 100);

/// Model input shape: (batch, mel rows, time cols, channel)
///
/// Fixed by the trained artifact; must not change without retraining.
pub const FEATURE_SHAPE: [usize; 4] = [1, TARGET_SIZE.0, TARGET_SIZE.1, 1];

/// The fixed-shape tensor fed to the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTensor {
    data: Array4<f32>,
}

impl FeatureTensor {
    /// Wrap an existing array, checking it has [`FEATURE_SHAPE`]
    pub fn from_array(data: Array4<f32>) -> Result<Self> {
        if data.shape() != FEATURE_SHAPE {
            return Err(ClassifyError::Inference(format!(
                "Feature tensor shape {:?}, expected {:?}",
                data.shape(),
                FEATURE_SHAPE
            )));
        }
        Ok(Self { data })
    }

    /// Build from a mel spectrogram: resize, add channel axis, add batch axis
    pub fn from_spectrogram(mel: &MelSpectrogram) -> Self {
        let resized: Array2<f32> = resize::resize(&mel.bands, TARGET_SIZE);
        let data = resized.insert_axis(Axis(2)).insert_axis(Axis(0));
        debug_assert_eq!(data.shape(), FEATURE_SHAPE);
        Self { data }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }

    /// Largest absolute value in the tensor
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |m, &v| m.max(v.abs()))
    }
}

/// Turn a decoded signal into the classifier input
pub fn extract_features(signal: &AudioSignal) -> Result<FeatureTensor> {
    let mel = compute_mel_spectrogram(&signal.samples, signal.sample_rate)?;
    Ok(FeatureTensor::from_spectrogram(&mel))
}
