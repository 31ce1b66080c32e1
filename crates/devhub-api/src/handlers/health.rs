//! Health check handler.

use axum::http::StatusCode;

/// GET /api/v1/healthz
pub async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}
