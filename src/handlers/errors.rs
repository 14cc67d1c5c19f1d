use axum::{Json, http::StatusCode};

use crate::error::ConfigError;
use crate::models::common::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Caller misuse: bad source, mode, query or limit.
pub fn bad_request(err: ConfigError) -> ApiError {
    tracing::warn!("Rejected request: {}", err);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub fn not_found(message: String) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: message }))
}
