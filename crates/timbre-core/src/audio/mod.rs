//! Audio input: container detection and decoding

pub mod decoder;
pub mod format;

pub use decoder::{decode_file, downmix_to_mono};
pub use format::AudioFormat;

/// Decoded mono audio at the source's native sample rate
#[derive(Debug, Clone)]
pub struct AudioSignal {
    /// Mono samples, nominally in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate declared by the source file
    pub sample_rate: u32,
    /// Channel count of the source before downmixing
    pub channels: u16,
}

impl AudioSignal {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
