use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};

use super::classify::ClassifyResponse;
use crate::error::{ClassifyError, ErrorResponse};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BatchRequest {
    pub messages: Vec<String>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub verdicts: Vec<ClassifyResponse>,
}

pub async fn batch_classify(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Response {
    if request.messages.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "At least one message is required".to_string(),
                hint: Some("Provide {\"messages\": [\"...\"]}".to_string()),
            }),
        )
            .into_response();
    }

    let max = state.config.max_batch_size;
    if request.messages.len() > max {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Maximum {} messages per batch", max),
                hint: None,
            }),
        )
            .into_response();
    }

    let span = info_span!("classify_batch", request_id = %uuid::Uuid::new_v4());
    async move {
        let messages = request.messages;
        let verdicts = state.run_classification(messages.clone()).await?;
        info!("[spamcheck] Batch of {} classified", verdicts.len());
        let verdicts = verdicts
            .into_iter()
            .zip(&messages)
            .map(|(verdict, message)| ClassifyResponse::new(verdict, message))
            .collect();
        Ok::<_, ClassifyError>(Json(BatchResponse { verdicts }))
    }
    .instrument(span)
    .await
    .into_response()
}
