//! Error types for the classification pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the model artifact.
///
/// Cloneable so the shared classifier can cache it and hand the same
/// failure to every later caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load model {path}: {reason}")]
pub struct ModelLoadError {
    /// Path the artifact was expected at
    pub path: PathBuf,
    /// What went wrong (missing file, corrupt graph, runtime init failure)
    pub reason: String,
}

impl ModelLoadError {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while turning audio into a genre prediction
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Classifier unavailable: {0}")]
    ModelLoad(#[from] ModelLoadError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClassifyError {
    /// Stable short name of the failure kind, for boundary reporting
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::UnsupportedFormat(_) => "unsupported-format",
            Self::ModelLoad(_) => "model-load",
            Self::Inference(_) => "inference",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
