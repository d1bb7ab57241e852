use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};

use crate::error::{ClassifyError, InferenceError};
use crate::service::{Label, MessageStats, Verdict};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct ClassifyResponse {
    pub label: Label,
    pub confidence: f64,
    pub raw_score: f64,
    pub stats: MessageStats,
}

impl ClassifyResponse {
    pub fn new(verdict: Verdict, message: &str) -> Self {
        Self {
            label: verdict.label,
            confidence: verdict.confidence,
            raw_score: verdict.raw_score,
            stats: MessageStats::of(message),
        }
    }
}

pub async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ClassifyError> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("classify", %request_id);

    async move {
        let message = request.message;
        let mut verdicts = state.run_classification(vec![message.clone()]).await?;
        let verdict = verdicts
            .pop()
            .ok_or(InferenceError::ShapeMismatch { expected: 1, actual: 0 })?;
        info!(
            "[spamcheck] {} ({:.1}% confidence)",
            verdict.label.as_str(),
            verdict.confidence
        );
        Ok::<_, ClassifyError>(Json(ClassifyResponse::new(verdict, &message)))
    }
    .instrument(span)
    .await
}
