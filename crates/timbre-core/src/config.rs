//! Configuration for timbre
//!
//! Configuration is stored as YAML.
//! Default location: `<config dir>/timbre/config.yaml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model artifact settings
    pub model: ModelConfig,
    /// Directory for temporary copies of uploaded audio.
    /// `None` uses the system temp directory.
    pub temp_dir: Option<PathBuf>,
}

/// Where the pretrained model lives and how it runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// ONNX model file
    pub model_path: PathBuf,
    /// ONNX Runtime intra-op threads (1-16)
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            intra_threads: 1,
        }
    }
}

impl ModelConfig {
    /// Clamp values to supported ranges
    pub fn validate(&mut self) {
        self.intra_threads = self.intra_threads.clamp(1, 16);
    }
}

/// Get the default model path
///
/// Returns: `<data dir>/timbre/genre-classifier.onnx`
pub fn default_model_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
        .join("genre-classifier.onnx")
}

/// Get the default config file path
///
/// Returns: `<config dir>/timbre/config.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
        .join("config.yaml")
}

/// Load the timbre configuration, validating values.
///
/// A missing file means "use defaults". An unreadable or malformed file is
/// logged and also falls back to defaults, so a bad config never blocks
/// classification; only the model itself can do that.
pub fn load(path: &Path) -> Config {
    let mut config = match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
            Ok(config) => {
                log::info!("Using config {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("Ignoring malformed config {:?}: {}", path, e);
                Config::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No config at {:?}, using defaults", path);
            Config::default()
        }
        Err(e) => {
            log::warn!("Cannot read config {:?}: {}, using defaults", path, e);
            Config::default()
        }
    };

    let requested_threads = config.model.intra_threads;
    config.model.validate();
    if config.model.intra_threads != requested_threads {
        log::warn!(
            "intra_threads {} out of range, using {}",
            requested_threads,
            config.model.intra_threads
        );
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.intra_threads, 1);
        assert!(config.model.model_path.ends_with("timbre/genre-classifier.onnx"));
        assert!(config.temp_dir.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config = load(Path::new("/nonexistent/path/config.yaml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = Config {
            model: ModelConfig {
                model_path: PathBuf::from("/opt/models/genre.onnx"),
                intra_threads: 4,
            },
            temp_dir: Some(dir.path().to_path_buf()),
        };

        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();
        assert_eq!(load(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "model:\n  intra_threads: 64\n").unwrap();

        let config = load(&path);
        assert_eq!(config.model.intra_threads, 16);
        assert_eq!(config.model.model_path, default_model_path());
    }

    #[test]
    fn test_invalid_yaml_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "model: [unclosed").unwrap();
        assert_eq!(load(&path), Config::default());
    }

    #[test]
    fn test_unreadable_path_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load(dir.path()), Config::default());
    }
}
