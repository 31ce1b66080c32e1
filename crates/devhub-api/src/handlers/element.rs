//! Tree element handlers.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;

use devhub_core::error::AppError;
use devhub_entity::system_file::SystemFile;
use devhub_service::NodeForm;

use crate::dto::ApiResponse;
use crate::dto::request::ElementQuery;
use crate::extractors::{AuthUser, MultipartForm};
use crate::handlers::parse_id;
use crate::state::AppState;

/// PUT /api/v1/repository/element/{id}?parent=
///
/// Multipart fields: `name`, `is_directory`, and a `file` part for files.
pub async fn create_element(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<ElementQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SystemFile>>), AppError> {
    let id = parse_id(&id)?;
    let form = MultipartForm::read(multipart).await?;

    let node_form = NodeForm {
        name: form.text("name").unwrap_or_default().to_string(),
        is_directory: form.flag("is_directory"),
    };
    let node = state
        .repository_service
        .create_element(id, &auth, query.parent, node_form, form.file)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Element created", node)),
    ))
}

/// DELETE /api/v1/repository/{id}/{element}
pub async fn delete_element(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, element)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = parse_id(&id)?;
    let element_id = parse_id(&element)?;
    state
        .repository_service
        .delete_element(id, element_id, &auth)
        .await?;
    Ok(Json(ApiResponse::message("Element deleted")))
}
