use axum::extract::State;
use axum::Json;

use crate::state::AppState;
use crate::stats::StatsSnapshot;

pub async fn metrics(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}
