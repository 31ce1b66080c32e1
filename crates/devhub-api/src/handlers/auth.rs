//! Auth handlers: register, confirm, login, refresh, logout.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use devhub_core::error::AppError;
use devhub_entity::user::UserSummary;
use devhub_service::{LoginResponse, RefreshResponse, RegisterRequest};

use crate::dto::ApiResponse;
use crate::dto::request::{ConfirmQuery, LoginRequest, RefreshRequest};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/v1/auth
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserSummary>>), AppError> {
    let user = state.auth_service.register(req).await?;
    let message = if state.config.auth.require_confirmation {
        "Account created, confirm it with the link sent by e-mail"
    } else {
        "Account created"
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(message, user)),
    ))
}

/// GET /api/v1/auth/confirm?token=
pub async fn confirm(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.auth_service.confirm(&query.token).await?;
    Ok(Json(ApiResponse::message("Account confirmed")))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let result = state.auth_service.login(&req.email, &req.password).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, AppError> {
    let result = state.auth_service.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.auth_service.logout(&auth.claims).await?;
    Ok(Json(ApiResponse::message("Logged out successfully")))
}
