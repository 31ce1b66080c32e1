//! `AuthUser` extractor: pulls the bearer token from the Authorization
//! header, validates it, and injects the request context.
//!
//! Routes open to anonymous callers take `Option<AuthUser>`. A missing
//! header yields `None`; a header carrying a bad token is still rejected.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use devhub_auth::Claims;
use devhub_core::error::AppError;
use devhub_service::RequestContext;

use crate::state::AppState;

type BearerHeader = TypedHeader<Authorization<Bearer>>;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Context passed to the services.
    pub ctx: RequestContext,
    /// Verified token claims, needed to revoke the token on logout.
    pub claims: Claims,
}

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    async fn from_token(state: &AppState, token: &str) -> Result<Self, AppError> {
        let claims = state.auth_service.decoder().decode_access_token(token).await?;
        let ctx = RequestContext::new(claims.user_id(), claims.role, claims.username.clone());
        Ok(Self { ctx, claims })
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            <BearerHeader as FromRequestParts<AppState>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    if e.is_missing() {
                        AppError::unauthorized("Missing Authorization header")
                    } else {
                        AppError::unauthorized("Invalid Authorization header format")
                    }
                })?;

        Self::from_token(state, bearer.token()).await
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match <BearerHeader as FromRequestParts<AppState>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(Authorization(bearer))) => {
                Self::from_token(state, bearer.token()).await.map(Some)
            }
            Err(e) if e.is_missing() => Ok(None),
            Err(_) => Err(AppError::unauthorized(
                "Invalid Authorization header format",
            )),
        }
    }
}

/// The principal's context, if any, for services taking `Option<&RequestContext>`.
pub fn optional_context(user: &Option<AuthUser>) -> Option<&RequestContext> {
    user.as_ref().map(AuthUser::context)
}
