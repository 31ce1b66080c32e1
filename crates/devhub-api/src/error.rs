//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use devhub_core::error::{AppError, ErrorKind};

use crate::dto::ApiResponse;

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.kind {
            ErrorKind::Internal => {
                tracing::error!(error = %self.message, source = ?self.source, "Internal server error");
            }
            ErrorKind::ServiceUnavailable => {
                tracing::warn!(error = %self.message, source = ?self.source, "Backing service failure");
            }
            _ => {}
        }

        let body: ApiResponse<()> = ApiResponse::message(self.message);
        (status_for(self.kind), Json(body)).into_response()
    }
}
