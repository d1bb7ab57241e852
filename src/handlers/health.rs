use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_id: Option<String>,
    pub ready: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let handle = state.service.handle();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: concat!("spamcheck-v", env!("CARGO_PKG_VERSION")).to_string(),
        model_id: handle.descriptor().map(|d| d.id.clone()),
        ready: handle.is_loaded(),
    })
}
