use axum::Json;

use crate::api::types::HealthResponse;
use crate::error::{api_not_found, ApiError};

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn not_found() -> ApiError {
    api_not_found("route not found")
}
