//! End-to-end request handling: audio in, genre distribution out
//!
//! One request runs start to finish on the calling thread. Uploads held in
//! memory are written to a scoped temporary file first; the file is removed
//! when the request ends, whichever way it ends.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::{decode_file, AudioFormat, AudioSignal};
use crate::classifier::{self, Classifier};
use crate::config::Config;
use crate::error::{ModelLoadError, Result};
use crate::features::{extract_features, FeatureTensor};
use crate::prediction::Prediction;

/// Prediction plus facts about the decoded source
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub prediction: Prediction,
    /// Native sample rate of the input
    pub sample_rate: u32,
    /// Channel count before downmixing
    pub channels: u16,
    pub duration_secs: f64,
}

/// Decode a file and build the classifier input.
///
/// Returns the decoded signal alongside the tensor so callers can report on
/// the source.
pub fn extract_file_features(path: &Path) -> Result<(AudioSignal, FeatureTensor)> {
    let signal = decode_file(path)?;
    let features = extract_features(&signal)?;
    Ok((signal, features))
}

/// Classification pipeline bound to one classifier instance
#[derive(Debug, Clone)]
pub struct Pipeline {
    classifier: Arc<Classifier>,
    temp_dir: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(classifier: Arc<Classifier>) -> Self {
        Self {
            classifier,
            temp_dir: None,
        }
    }

    /// Pipeline on the process-wide classifier, loading it if needed.
    ///
    /// The model settings in `config` only take effect if nothing has loaded
    /// the shared classifier yet.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ModelLoadError> {
        if !classifier::configure(config.model.clone()) {
            log::warn!("Model settings already fixed for this process, ignoring new ones");
        }
        let classifier = classifier::shared()?;
        Ok(Self::new(classifier).with_temp_dir(config.temp_dir.clone()))
    }

    /// Put temporary upload copies in `dir` instead of the system temp dir
    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    /// Classify an audio file on disk
    pub fn predict_file(&self, path: &Path) -> Result<Classification> {
        let (signal, features) = extract_file_features(path)?;
        let prediction = self.classifier.classify(&features)?;

        let (genre, probability) = prediction.top();
        log::info!(
            "{}: {} ({:.1}%) from {:.1}s at {} Hz",
            path.display(),
            genre,
            probability * 100.0,
            signal.duration_secs(),
            signal.sample_rate
        );

        Ok(Classification {
            prediction,
            sample_rate: signal.sample_rate,
            channels: signal.channels,
            duration_secs: signal.duration_secs(),
        })
    }

    /// Classify uploaded bytes.
    ///
    /// `name_hint` is the original file name, used to pick the container;
    /// without it the bytes are sniffed.
    pub fn predict_bytes(&self, bytes: &[u8], name_hint: Option<&str>) -> Result<Classification> {
        let format = AudioFormat::for_upload(bytes, name_hint)?;

        let suffix = format!(".{}", format.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("timbre_upload_").suffix(&suffix);

        // Removed on drop, on every return path below
        let mut temp_file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        temp_file.write_all(bytes)?;
        temp_file.flush()?;

        log::debug!("Upload staged at {:?} ({} bytes)", temp_file.path(), bytes.len());

        self.predict_file(temp_file.path())
    }
}
