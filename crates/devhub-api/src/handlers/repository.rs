//! Repository handlers: listings, pages, updates, likes, links, downloads.
//!
//! On mutating routes the first path segment after `/repository` carries
//! the repository id; on reads it carries the owner's username.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};

use devhub_core::error::AppError;
use devhub_core::types::PageResponse;
use devhub_entity::repository::{Link, NewLink, NewRepository, Repository, RepositoryUpdate};
use devhub_entity::system_file::SystemFile;
use devhub_service::RepositoryDetail;

use crate::dto::ApiResponse;
use crate::dto::request::{DownloadQuery, LikeRequest, RepositoryListQuery};
use crate::extractors::AuthUser;
use crate::extractors::auth::optional_context;
use crate::handlers::parse_id;
use crate::state::AppState;

/// POST /api/v1/repository
pub async fn upload_repository(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewRepository>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let repository = state
        .repository_service
        .upload_repository(&auth, req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Repository created",
            json!({ "id": repository.id }),
        )),
    ))
}

/// GET /api/v1/repository?page&search&total
pub async fn get_repositories(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Query(query): Query<RepositoryListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Repository>>>, AppError> {
    let page = state
        .repository_service
        .get_repositories(optional_context(&auth), query.search, query.page, query.total)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/v1/repository/{username}
pub async fn get_user_repositories(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path(username): Path<String>,
    Query(query): Query<RepositoryListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Repository>>>, AppError> {
    let page = state
        .repository_service
        .get_user_repositories(&username, optional_context(&auth), query.page)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/v1/repository/{username}/{repository}
pub async fn get_repository(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((username, name)): Path<(String, String)>,
) -> Result<Json<ApiResponse<RepositoryDetail>>, AppError> {
    let detail = state
        .repository_service
        .get_repository(&username, &name, optional_context(&auth))
        .await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// GET /api/v1/repository/{username}/{repository}/{folder}
pub async fn get_folder(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path((username, name, folder)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<Vec<SystemFile>>>, AppError> {
    let folder_id = parse_id(&folder)?;
    let children = state
        .repository_service
        .get_folder(&username, &name, folder_id, optional_context(&auth))
        .await?;
    Ok(Json(ApiResponse::ok(children)))
}

/// PUT /api/v1/repository/{id}
pub async fn update_repository(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RepositoryUpdate>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = parse_id(&id)?;
    state
        .repository_service
        .update_repository(id, &auth, req)
        .await?;
    Ok(Json(ApiResponse::message("Repository updated")))
}

/// DELETE /api/v1/repository/{id}
pub async fn delete_repository(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = parse_id(&id)?;
    state.repository_service.delete_repository(id, &auth).await?;
    Ok(Json(ApiResponse::message("Repository deleted")))
}

/// POST /api/v1/repository/like/{id}
pub async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let id = parse_id(&id)?;
    let stars = state
        .repository_service
        .toggle_like(id, &auth, req.plus)
        .await?;
    Ok(Json(ApiResponse::ok(json!({ "stars": stars }))))
}

/// PUT /api/v1/repository/link/{id}
pub async fn add_link(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<NewLink>,
) -> Result<Json<ApiResponse<Link>>, AppError> {
    let id = parse_id(&id)?;
    let link = state.repository_service.add_link(id, &auth, req).await?;
    Ok(Json(ApiResponse::with_message("Link added", link)))
}

/// DELETE /api/v1/repository/{id}/link/{link}
pub async fn delete_link(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, link)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = parse_id(&id)?;
    let link_id = parse_id(&link)?;
    state
        .repository_service
        .delete_link(id, link_id, &auth)
        .await?;
    Ok(Json(ApiResponse::message("Link deleted")))
}

/// GET /api/v1/repository/download/{id}?child=
pub async fn download_repository(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path(id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let archive = state
        .repository_service
        .download_repository(id, optional_context(&auth), query.child)
        .await?;

    let filename = archive.name.replace(['\'', '"', '\r', '\n'], "_");
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename='{filename}.zip'"),
        )
        .body(Body::from_stream(archive.stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))
}
