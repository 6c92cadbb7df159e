use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{FileKind, FileNode};

/// Body of `POST /files`. Field-level validation happens in the service so
/// malformed values surface as the documented 400s rather than rejections.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    /// Base64-encoded content, required unless `type` is `folder`.
    pub data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub parent_id: Option<String>,
    pub page: Option<String>,
}

/// Zero-based page number; negative or non-numeric input coerces to 0.
pub(crate) fn page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.parse::<i64>().ok())
        .filter(|p| *p >= 0)
        .unwrap_or(0)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNodeResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub is_public: bool,
    pub parent_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl From<FileNode> for FileNodeResponse {
    fn from(node: FileNode) -> Self {
        Self {
            id: node.id,
            user_id: node.user_id,
            name: node.name,
            kind: node.kind,
            is_public: node.is_public,
            parent_id: node.parent_id,
            local_path: node.local_path,
        }
    }
}
