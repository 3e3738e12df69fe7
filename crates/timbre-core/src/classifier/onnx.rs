//! ONNX Runtime backend
//!
//! The pretrained network is shipped as an ONNX graph taking one f32 input of
//! shape `[1, 100, 100, 1]` and producing a `[1, 10]` softmax output. Inputs are
//! bound positionally so the exporter's tensor names don't matter.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;

use super::GenreModel;
use crate::error::{ClassifyError, ModelLoadError, Result};
use crate::features::FeatureTensor;

/// Genre network running on ONNX Runtime
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex.
/// The weights are never modified after load.
pub struct OnnxGenreModel {
    session: Mutex<Session>,
    path: PathBuf,
}

impl OnnxGenreModel {
    /// Load the model artifact from `path`.
    ///
    /// # Arguments
    /// * `path` - ONNX file
    /// * `intra_threads` - ONNX Runtime intra-op thread count
    pub fn load(path: &Path, intra_threads: usize) -> std::result::Result<Self, ModelLoadError> {
        if !path.exists() {
            return Err(ModelLoadError::new(path, "model file not found"));
        }

        log::info!("Loading genre model from {:?}", path);

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(intra_threads.max(1)))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| ModelLoadError::new(path, e.to_string()))?;

        log::info!("Genre model ready ({:?})", path.file_name().unwrap_or_default());

        Ok(Self {
            session: Mutex::new(session),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GenreModel for OnnxGenreModel {
    fn predict(&self, input: &FeatureTensor) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input.as_array().clone())
            .map_err(|e| ClassifyError::Inference(format!("Tensor creation error: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifyError::Inference("Model session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ClassifyError::Inference(format!("Forward pass failed: {}", e)))?;

        let (_, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| ClassifyError::Inference("Model produced no output".to_string()))?;

        let (_shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifyError::Inference(format!("Output extraction error: {}", e)))?;

        Ok(data.to_vec())
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_is_load_error() {
        let err = OnnxGenreModel::load(Path::new("/nonexistent/genre.onnx"), 1)
            .err()
            .unwrap();
        assert_eq!(err.path, PathBuf::from("/nonexistent/genre.onnx"));
        assert!(err.reason.contains("not found"));
    }

    #[test]
    fn test_corrupt_artifact_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre.onnx");
        std::fs::write(&path, b"definitely not a protobuf graph").unwrap();
        let err = OnnxGenreModel::load(&path, 1).err().unwrap();
        assert_eq!(err.path, path);
    }
}
