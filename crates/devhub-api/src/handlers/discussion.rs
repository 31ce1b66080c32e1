//! Discussion handlers.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;

use devhub_core::error::AppError;
use devhub_core::types::PageResponse;
use devhub_entity::discussion::{Discussion, NewDiscussion};
use devhub_service::PublishedDiscussion;

use crate::dto::ApiResponse;
use crate::dto::request::DiscussionListQuery;
use crate::extractors::auth::optional_context;
use crate::extractors::{AuthUser, MultipartForm};
use crate::handlers::parse_id;
use crate::state::AppState;

/// POST /api/v1/discussion
///
/// Multipart fields: `title`, `text`, `snippet`, `tags` (repeated or
/// comma-separated), `repository`, and an optional image part.
pub async fn publish(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<PublishedDiscussion>>), AppError> {
    let form = MultipartForm::read(multipart).await?;

    let repository_id = match form.text("repository").map(str::trim) {
        Some(id) if !id.is_empty() => Some(parse_id(id)?),
        _ => None,
    };
    let data = NewDiscussion {
        title: form.text("title").unwrap_or_default().trim().to_string(),
        text: form.text("text").unwrap_or_default().to_string(),
        snippet: form.text("snippet").map(str::to_string),
        tags: form.list("tags"),
        repository_id,
    };

    let published = state
        .discussion_service
        .publish(&auth, data, form.file)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Discussion published", published)),
    ))
}

/// GET /api/v1/discussion?page&repository&search
pub async fn list(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Query(query): Query<DiscussionListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Discussion>>>, AppError> {
    let page = state
        .discussion_service
        .list(
            optional_context(&auth),
            query.repository,
            query.search,
            query.page,
        )
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/v1/discussion/{code}
pub async fn get(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Discussion>>, AppError> {
    let discussion = state
        .discussion_service
        .get(&code, optional_context(&auth))
        .await?;
    Ok(Json(ApiResponse::ok(discussion)))
}
