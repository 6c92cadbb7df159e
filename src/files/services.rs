use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::thumbs::ThumbnailJob;

use super::dto::UploadRequest;
use super::repo::{FileKind, FileNode};

/// Validate an upload request and persist the resulting node.
///
/// Folders never touch the blob store. Files and images get their content
/// decoded and written first, so a crash between the two writes leaves at
/// worst an orphaned blob, never a dangling metadata record. Image uploads
/// enqueue a thumbnail job after the record is persisted; a full queue or a
/// dead worker must not fail the upload.
pub async fn create_node(
    state: &AppState,
    user_id: Uuid,
    req: UploadRequest,
) -> ApiResult<FileNode> {
    let name = req
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing name".into()))?;
    let kind = req
        .kind
        .as_deref()
        .and_then(|k| k.parse::<FileKind>().ok())
        .ok_or_else(|| ApiError::Validation("Missing type".into()))?;

    let data = match kind {
        FileKind::Folder => None,
        FileKind::File | FileKind::Image => {
            let raw = req
                .data
                .ok_or_else(|| ApiError::Validation("Missing data".into()))?;
            let bytes = STANDARD
                .decode(raw.as_bytes())
                .map_err(|_| ApiError::Validation("Missing data".into()))?;
            Some(bytes)
        }
    };

    let parent_id = match req.parent_id {
        None => None,
        Some(raw) => {
            let pid = Uuid::parse_str(&raw)
                .map_err(|_| ApiError::Validation("Parent not found".into()))?;
            let parent = FileNode::find_by_id(&state.db, pid)
                .await?
                .ok_or_else(|| ApiError::Validation("Parent not found".into()))?;
            if parent.kind != FileKind::Folder {
                return Err(ApiError::Validation("Parent is not a folder".into()));
            }
            Some(pid)
        }
    };

    let mut node = FileNode {
        id: Uuid::new_v4(),
        user_id,
        name,
        kind,
        is_public: req.is_public,
        parent_id,
        local_path: None,
        created_at: OffsetDateTime::now_utc(),
    };

    if let Some(bytes) = data {
        let blob_id = Uuid::new_v4().to_string();
        let size = bytes.len();
        let path = state.blobs.write(&blob_id, Bytes::from(bytes)).await?;
        debug!(file_id = %node.id, blob = %path, size, "blob written");
        node.local_path = Some(path);
    }

    FileNode::insert(&state.db, &node).await?;
    info!(file_id = %node.id, kind = %node.kind, "file node created");

    if node.kind == FileKind::Image {
        state.thumbs.enqueue(ThumbnailJob {
            file_id: node.id,
            user_id,
        });
    }

    Ok(node)
}

/// Flip visibility on an owned node and return the stored record, not the
/// pre-mutation snapshot.
pub async fn set_visibility(
    state: &AppState,
    user_id: Uuid,
    file_id: Uuid,
    is_public: bool,
) -> ApiResult<FileNode> {
    FileNode::find_owned(&state.db, file_id, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    FileNode::set_public(&state.db, file_id, user_id, is_public).await?;
    FileNode::find_owned(&state.db, file_id, user_id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Resolve a download to the blob bytes plus the MIME type inferred from the
/// file name. Private nodes are invisible to non-owners: every denial is the
/// same `Not found` a missing id produces.
pub async fn download(
    state: &AppState,
    requester: Option<Uuid>,
    file_id: Uuid,
) -> ApiResult<(Vec<u8>, String)> {
    let node = FileNode::find_by_id(&state.db, file_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if !node.is_public && requester != Some(node.user_id) {
        return Err(ApiError::NotFound);
    }
    if node.kind == FileKind::Folder {
        return Err(ApiError::BadRequest("A folder doesn't have content".into()));
    }

    let path = node.local_path.as_deref().ok_or(ApiError::NotFound)?;
    let bytes = state.blobs.read(path).await?.ok_or(ApiError::NotFound)?;

    let mime = mime_guess::from_path(&node.name)
        .first_or_octet_stream()
        .to_string();
    Ok((bytes, mime))
}
