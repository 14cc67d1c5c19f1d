use axum::{Json, extract::State};

use crate::{AppState, models::common::HealthResponse};

/// Handler for GET /
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sources: state.aggregator.source_ids(),
    })
}
