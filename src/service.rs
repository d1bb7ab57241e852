use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ClassifyError, InferenceError};
use crate::handle::ModelHandle;

/// Scores at or above this are spam.
pub const SPAM_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Spam => "spam",
            Label::Ham => "ham",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Label::Spam => "SPAM DETECTED",
            Label::Ham => "LEGITIMATE MESSAGE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    pub raw_score: f64,
    /// Confidence in the assigned label, in percent.
    pub confidence: f64,
}

impl Verdict {
    pub fn from_score(raw_score: f64) -> Self {
        if raw_score >= SPAM_THRESHOLD {
            Self {
                label: Label::Spam,
                raw_score,
                confidence: raw_score * 100.0,
            }
        } else {
            Self {
                label: Label::Ham,
                raw_score,
                confidence: (1.0 - raw_score) * 100.0,
            }
        }
    }
}

/// Counters shown next to the input box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MessageStats {
    /// Characters after trimming surrounding whitespace.
    pub characters: usize,
    pub words: usize,
    /// Characters as submitted.
    pub length: usize,
}

impl MessageStats {
    pub fn of(message: &str) -> Self {
        Self {
            characters: message.trim().chars().count(),
            words: message.split_whitespace().count(),
            length: message.chars().count(),
        }
    }
}

pub fn is_blank(message: &str) -> bool {
    message.trim().is_empty()
}

pub struct ClassificationService {
    handle: Arc<ModelHandle>,
}

impl ClassificationService {
    pub fn new(handle: Arc<ModelHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    pub fn classify(&self, message: &str) -> Result<Verdict, ClassifyError> {
        if is_blank(message) {
            return Err(ClassifyError::EmptyInput);
        }

        let model = self.handle.get()?;
        let scores = model.infer(&[message])?;
        let raw_score = single_score(&scores)?;

        let verdict = Verdict::from_score(raw_score);
        debug!(
            "[spamcheck] Classified {} chars as {} (score {:.4})",
            message.chars().count(),
            verdict.label.as_str(),
            raw_score
        );
        Ok(verdict)
    }

    /// All messages are validated before any inference runs; one blank
    /// message rejects the whole batch.
    pub fn classify_batch<S: AsRef<str>>(&self, messages: &[S]) -> Result<Vec<Verdict>, ClassifyError> {
        if let Some(pos) = messages.iter().position(|m| is_blank(m.as_ref())) {
            warn!("[spamcheck] Batch rejected: message {} is empty", pos);
            return Err(ClassifyError::EmptyInput);
        }
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.handle.get()?;
        let batch: Vec<&str> = messages.iter().map(|m| m.as_ref()).collect();
        let scores = model.infer(&batch)?;
        if scores.len() != batch.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: batch.len(),
                actual: scores.len(),
            }
            .into());
        }

        scores
            .into_iter()
            .map(|s| checked(s).map(Verdict::from_score))
            .collect()
    }
}

fn single_score(scores: &[f64]) -> Result<f64, ClassifyError> {
    match scores {
        [score] => checked(*score),
        other => Err(InferenceError::ShapeMismatch {
            expected: 1,
            actual: other.len(),
        }
        .into()),
    }
}

/// Every `Classifier` passes through here, so this is the one range check.
/// Scores outside the unit interval mean the final layer is not a probability.
fn checked(score: f64) -> Result<f64, ClassifyError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(InferenceError::InvalidOutput(format!("score {} is outside [0, 1]", score)).into())
    }
}
