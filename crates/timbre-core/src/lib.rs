//! Timbre Core - music genre classification from audio clips
//!
//! Turns an MP3/WAV clip into a probability distribution over ten genres:
//!
//! 1. **Decode** (`audio`): Symphonia, mono downmix, native sample rate kept
//! 2. **Features** (`features`): mel power spectrogram resized to a
//!    `(1, 100, 100, 1)` tensor
//! 3. **Classify** (`classifier`): pretrained ONNX network, loaded once per
//!    process and shared
//! 4. **Interpret** (`prediction`): arg-max genre, confidence, full distribution
//!
//! ```no_run
//! use std::path::Path;
//! use timbre_core::{config::Config, Pipeline};
//!
//! let pipeline = Pipeline::from_config(&Config::default())?;
//! let result = pipeline.predict_file(Path::new("clip.wav"))?;
//! let (genre, p) = result.prediction.top();
//! println!("{} ({:.1}%)", genre, p * 100.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod error;
pub mod features;
pub mod genre;
pub mod pipeline;
pub mod prediction;

pub use classifier::{Classifier, GenreModel};
pub use error::{ClassifyError, ModelLoadError};
pub use features::{FeatureTensor, FEATURE_SHAPE};
pub use genre::Genre;
pub use pipeline::{Classification, Pipeline};
pub use prediction::{GenreProbability, Prediction, PredictionSummary};
