use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use crate::config::Config;
use crate::error::{ClassifyError, InferenceError};
use crate::service::{ClassificationService, Verdict};
use crate::stats::ServiceStats;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub service: Arc<ClassificationService>,
    pub stats: Arc<ServiceStats>,
}

impl AppState {
    pub fn new(config: Config, service: ClassificationService) -> Self {
        Self {
            config,
            service: Arc::new(service),
            stats: Arc::new(ServiceStats::new()),
        }
    }

    /// Runs one batch through the service on the blocking pool, bounded by
    /// the configured timeout. A panicking engine becomes an `InferenceError`.
    pub async fn run_classification(&self, messages: Vec<String>) -> Result<Vec<Verdict>, ClassifyError> {
        let service = Arc::clone(&self.service);
        let timeout = self.config.inference_timeout;
        let start = Instant::now();

        let task = tokio::task::spawn_blocking(move || {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| match messages.as_slice() {
                [single] => service.classify(single).map(|v| vec![v]),
                many => service.classify_batch(many),
            }))
        });

        let result = match tokio::time::timeout(timeout, task).await {
            Err(_) => Err(InferenceError::Timeout(timeout.as_millis() as u64).into()),
            Ok(Err(e)) => {
                error!("[spamcheck] Inference task failed: {:?}", e);
                Err(InferenceError::Engine("inference task failed".to_string()).into())
            }
            Ok(Ok(Err(_))) => {
                error!("[spamcheck] Inference panicked");
                Err(InferenceError::Engine("inference engine panicked".to_string()).into())
            }
            Ok(Ok(Ok(result))) => result,
        };

        match &result {
            Ok(verdicts) => self.stats.record_verdicts(verdicts, start.elapsed()),
            Err(e) => self.stats.record_error(e),
        }
        result
    }
}
