use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::{AuthUser, MaybeAuthUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::dto::{page_number, FileNodeResponse, ListQuery, UploadRequest};
use super::repo::{FileNode, PAGE_SIZE};
use super::services;

/// POST /files
#[instrument(skip(state, req))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<UploadRequest>,
) -> ApiResult<(StatusCode, Json<FileNodeResponse>)> {
    let node = services::create_node(&state, user_id, req).await?;
    Ok((StatusCode::CREATED, Json(node.into())))
}

/// GET /files/:id
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FileNodeResponse>> {
    let id = parse_file_id(&id)?;
    let node = FileNode::find_owned(&state.db, id, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(node.into()))
}

/// GET /files?parentId=&page=
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<FileNodeResponse>>> {
    let parent_id = match q.parent_id.as_deref() {
        None => None,
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            // A parent reference that cannot exist matches nothing.
            Err(_) => return Ok(Json(Vec::new())),
        },
    };

    let page = page_number(q.page.as_deref());
    let nodes = FileNode::list_page(&state.db, user_id, parent_id, PAGE_SIZE, page * PAGE_SIZE)
        .await?
        .into_iter()
        .map(FileNodeResponse::from)
        .collect();
    Ok(Json(nodes))
}

/// PUT /files/:id/publish
#[instrument(skip(state))]
pub async fn publish(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FileNodeResponse>> {
    let id = parse_file_id(&id)?;
    let node = services::set_visibility(&state, user_id, id, true).await?;
    Ok(Json(node.into()))
}

/// PUT /files/:id/unpublish
#[instrument(skip(state))]
pub async fn unpublish(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FileNodeResponse>> {
    let id = parse_file_id(&id)?;
    let node = services::set_visibility(&state, user_id, id, false).await?;
    Ok(Json(node.into()))
}

/// GET /files/:id/data — the one endpoint where the token is optional.
#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    MaybeAuthUser(requester): MaybeAuthUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_file_id(&id)?;
    let (bytes, mime) = services::download(&state, requester, id).await?;
    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}

/// Ids that are not UUIDs cannot name a record; report them the same way a
/// missing record is reported.
fn parse_file_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}
