use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::ClassifyError;
use crate::service::{Label, Verdict};

/// Process-lifetime outcome counters. Verdicts themselves are never kept.
#[derive(Default)]
pub struct ServiceStats {
    spam: AtomicU64,
    ham: AtomicU64,
    rejected_empty: AtomicU64,
    load_failures: AtomicU64,
    inference_failures: AtomicU64,
    inference_calls: AtomicU64,
    inference_micros: AtomicU64,
}

#[derive(Clone, Debug, Serialize, Default, PartialEq)]
pub struct StatsSnapshot {
    pub classified: u64,
    pub spam: u64,
    pub ham: u64,
    pub rejected_empty: u64,
    pub load_failures: u64,
    pub inference_failures: u64,
    pub avg_inference_ms: Option<f64>,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_verdicts(&self, verdicts: &[Verdict], elapsed: Duration) {
        for verdict in verdicts {
            match verdict.label {
                Label::Spam => self.spam.fetch_add(1, Ordering::Relaxed),
                Label::Ham => self.ham.fetch_add(1, Ordering::Relaxed),
            };
        }
        self.inference_calls.fetch_add(1, Ordering::Relaxed);
        self.inference_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_error(&self, err: &ClassifyError) {
        let counter = match err {
            ClassifyError::EmptyInput => &self.rejected_empty,
            ClassifyError::ModelLoad(_) => &self.load_failures,
            ClassifyError::Inference(_) => &self.inference_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let spam = self.spam.load(Ordering::Relaxed);
        let ham = self.ham.load(Ordering::Relaxed);
        let calls = self.inference_calls.load(Ordering::Relaxed);
        let micros = self.inference_micros.load(Ordering::Relaxed);

        StatsSnapshot {
            classified: spam + ham,
            spam,
            ham,
            rejected_empty: self.rejected_empty.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
            avg_inference_ms: (calls > 0).then(|| micros as f64 / calls as f64 / 1000.0),
        }
    }
}
