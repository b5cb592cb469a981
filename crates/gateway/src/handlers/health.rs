use crate::state::{AppState, HealthResponse};
use axum::{Json, extract::State};

/// Liveness plus whether the model loaded; a degraded process still answers.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: state.service.is_ready(),
    })
}
