//! Public user profile handler.

use axum::Json;
use axum::extract::{Path, State};

use devhub_core::error::AppError;
use devhub_entity::user::UserSummary;

use crate::dto::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/user/{username}
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserSummary>>, AppError> {
    let user = state.user_service.get_user(&username).await?;
    Ok(Json(ApiResponse::ok(user)))
}
