//! Lazily loaded, process-wide classifier
//!
//! The first caller pays for the load; everyone else gets the same `Arc`.
//! Concurrent first callers block on a single load. A failed load is cached
//! and reported to every later caller; it is never retried.

use std::sync::{Arc, OnceLock};

use super::{Classifier, OnnxGenreModel};
use crate::config::ModelConfig;
use crate::error::ModelLoadError;

type LoadOutcome = Result<Arc<Classifier>, ModelLoadError>;

/// Initialize-once cell holding a classifier or its load failure
pub struct SharedClassifier {
    cell: OnceLock<LoadOutcome>,
}

impl SharedClassifier {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Return the cached classifier, running `load` only if nothing is cached
    pub fn get_or_load<F>(&self, load: F) -> LoadOutcome
    where
        F: FnOnce() -> Result<Classifier, ModelLoadError>,
    {
        self.cell
            .get_or_init(|| match load() {
                Ok(classifier) => {
                    log::info!("Classifier loaded ({})", classifier.model_name());
                    Ok(Arc::new(classifier))
                }
                Err(e) => {
                    log::error!("{}", e);
                    Err(e)
                }
            })
            .clone()
    }

    /// Cached outcome, if a load has already been attempted
    pub fn get(&self) -> Option<LoadOutcome> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }
}

impl Default for SharedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

static CLASSIFIER: SharedClassifier = SharedClassifier::new();
static MODEL_CONFIG: OnceLock<ModelConfig> = OnceLock::new();

/// Set where and how the process-wide model is loaded.
///
/// Must happen before the first [`shared`] call. Returns `false` (and changes
/// nothing) if the settings were already fixed.
pub fn configure(config: ModelConfig) -> bool {
    MODEL_CONFIG.set(config).is_ok()
}

/// The process-wide classifier, loading it on first use
pub fn shared() -> LoadOutcome {
    CLASSIFIER.get_or_load(|| {
        let config = MODEL_CONFIG.get_or_init(ModelConfig::default);
        OnnxGenreModel::load(&config.model_path, config.intra_threads).map(Classifier::new)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::stub_classifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_sequential_calls_share_one_instance() {
        let cell = SharedClassifier::new();
        let loads = AtomicUsize::new(0);
        let load = || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(stub_classifier())
        };

        let first = cell.get_or_load(load).unwrap();
        let second = cell.get_or_load(load).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(cell.is_loaded());
    }

    #[test]
    fn test_failure_is_cached_without_retry() {
        let cell = SharedClassifier::new();
        let loads = AtomicUsize::new(0);
        let failing = || {
            loads.fetch_add(1, Ordering::SeqCst);
            Err(ModelLoadError::new("/models/missing.onnx", "model file not found"))
        };

        let first = cell.get_or_load(failing).unwrap_err();
        let second = cell.get_or_load(|| Ok(stub_classifier())).unwrap_err();

        assert_eq!(first, second);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(!cell.is_loaded());
        assert!(cell.get().unwrap().is_err());
    }

    #[test]
    fn test_concurrent_first_callers_load_once() {
        let cell = SharedClassifier::new();
        let loads = AtomicUsize::new(0);

        let instances: Vec<Arc<Classifier>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        cell.get_or_load(|| {
                            loads.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(20));
                            Ok(stub_classifier())
                        })
                        .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    // The only test touching the process-wide instance
    #[test]
    fn test_process_classifier_uses_first_configuration() {
        let missing = std::env::temp_dir().join("timbre-no-such-dir/genre.onnx");
        assert!(configure(ModelConfig {
            model_path: missing.clone(),
            intra_threads: 2,
        }));
        assert!(!configure(ModelConfig::default()));

        let first = shared().unwrap_err();
        let second = shared().unwrap_err();
        assert_eq!(first.path, missing);
        assert_eq!(first, second);
        assert!(CLASSIFIER.get().is_some());
        assert!(!CLASSIFIER.is_loaded());
    }

    #[test]
    fn test_get_before_load_is_none() {
        let cell = SharedClassifier::new();
        assert!(cell.get().is_none());
        assert!(!cell.is_loaded());
    }
}
