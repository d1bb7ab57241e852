use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::ErrorResponse;
use crate::models::ModelDescriptor;
use crate::state::AppState;

pub async fn model_info(
    State(state): State<AppState>,
) -> Result<Json<ModelDescriptor>, (StatusCode, Json<ErrorResponse>)> {
    state
        .service
        .handle()
        .descriptor()
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Model not loaded".to_string(),
                    hint: Some("Check GET /health".to_string()),
                }),
            )
        })
}
