//! Load-once access to the process's classifier.
//!
//! The handle is built in `main` and passed around explicitly. The first
//! `get()` runs the loader; concurrent first callers serialize on the init
//! guard so exactly one load happens and everyone sees the same instance.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;
use tracing::{error, info};

use crate::classifier::Classifier;
use crate::error::ModelLoadError;
use crate::models::{load_text_model, ModelDescriptor};

pub type LoadedModel = (Arc<dyn Classifier>, ModelDescriptor);

type Loader = Box<dyn Fn() -> Result<LoadedModel, ModelLoadError> + Send + Sync>;

pub struct ModelHandle {
    loader: Loader,
    init: Mutex<()>,
    model: OnceLock<LoadedModel>,
}

impl ModelHandle {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<LoadedModel, ModelLoadError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            init: Mutex::new(()),
            model: OnceLock::new(),
        }
    }

    /// Handle backed by the TF-IDF + dense network artifact in `dir`.
    pub fn from_dir(dir: PathBuf) -> Self {
        Self::new(move || {
            let (classifier, descriptor) = load_text_model(&dir)?;
            Ok((Arc::new(classifier) as Arc<dyn Classifier>, descriptor))
        })
    }

    pub fn get(&self) -> Result<Arc<dyn Classifier>, ModelLoadError> {
        if let Some((model, _)) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        // A panic inside a previous loader only poisons the guard, not the cell.
        let _guard = self.init.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((model, _)) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        let start = Instant::now();
        let loaded = (self.loader)().map_err(|e| {
            error!("[spamcheck] Model load failed: {}", e);
            e
        })?;
        info!(
            "[spamcheck] Model {} loaded in {}ms (hash {})",
            loaded.1.id,
            start.elapsed().as_millis(),
            loaded.1.model_hash
        );

        let model = Arc::clone(&loaded.0);
        // Only the init guard holder gets here, and it saw the cell empty.
        let stored = self.model.set(loaded);
        debug_assert!(stored.is_ok(), "model cell filled outside the init guard");
        Ok(model)
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    pub fn descriptor(&self) -> Option<&ModelDescriptor> {
        self.model.get().map(|(_, d)| d)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::InferenceError;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Returns the same score for every message and counts calls.
    pub struct FixedScore {
        pub score: f64,
        pub calls: AtomicUsize,
    }

    impl Classifier for FixedScore {
        fn infer(&self, batch: &[&str]) -> Result<Vec<f64>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![self.score; batch.len()])
        }
    }

    /// Blocks the calling thread for `delay` before scoring.
    pub struct Stalls {
        pub delay: Duration,
    }

    impl Classifier for Stalls {
        fn infer(&self, batch: &[&str]) -> Result<Vec<f64>, InferenceError> {
            std::thread::sleep(self.delay);
            Ok(vec![0.9; batch.len()])
        }
    }

    pub struct Panics;

    impl Classifier for Panics {
        fn infer(&self, _batch: &[&str]) -> Result<Vec<f64>, InferenceError> {
            panic!("engine blew up");
        }
    }

    pub fn descriptor(id: &str) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            input_dim: 1,
            vocab_size: 0,
            model_hash: "0x00".to_string(),
            loaded_at: Utc::now(),
        }
    }

    /// Handle whose loader hands out `classifier` and bumps `loads`.
    pub fn handle_with<C: Classifier + 'static>(
        classifier: Arc<C>,
        loads: Arc<AtomicUsize>,
    ) -> ModelHandle {
        ModelHandle::new(move || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok((Arc::clone(&classifier) as Arc<dyn Classifier>, descriptor("fixed")))
        })
    }

    /// Handle that always hands out `classifier`.
    pub fn handle_of<C: Classifier + 'static>(classifier: C) -> ModelHandle {
        let classifier = Arc::new(classifier);
        ModelHandle::new(move || {
            Ok((Arc::clone(&classifier) as Arc<dyn Classifier>, descriptor("test")))
        })
    }
}
