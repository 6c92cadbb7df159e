use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Fixed page size for listings.
pub const PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    File,
    Image,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Folder => "folder",
            FileKind::File => "file",
            FileKind::Image => "image",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(FileKind::Folder),
            "file" => Ok(FileKind::File),
            "image" => Ok(FileKind::Image),
            _ => Err(()),
        }
    }
}

/// Metadata record for a folder or a stored file/image.
///
/// `parent_id = None` is the root sentinel. `local_path` is set iff the node
/// carries blob content (`kind != Folder`). Only `is_public` mutates after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileNode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: FileKind,
    pub is_public: bool,
    pub parent_id: Option<Uuid>,
    pub local_path: Option<String>,
    pub created_at: OffsetDateTime,
}

impl FileNode {
    pub async fn insert(db: &SqlitePool, node: &FileNode) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO files (id, user_id, name, kind, is_public, parent_id, local_path, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(node.id)
        .bind(node.user_id)
        .bind(&node.name)
        .bind(node.kind)
        .bind(node.is_public)
        .bind(node.parent_id)
        .bind(node.local_path.as_deref())
        .bind(node.created_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> anyhow::Result<Option<FileNode>> {
        let node = sqlx::query_as::<_, FileNode>(
            r#"
            SELECT id, user_id, name, kind, is_public, parent_id, local_path, created_at
            FROM files
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(node)
    }

    /// Look up a node by id AND owner. Absence and foreign ownership are
    /// indistinguishable to callers.
    pub async fn find_owned(
        db: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<FileNode>> {
        let node = sqlx::query_as::<_, FileNode>(
            r#"
            SELECT id, user_id, name, kind, is_public, parent_id, local_path, created_at
            FROM files
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(node)
    }

    /// One page of an owner's nodes under a parent (`None` = root), in
    /// insertion order.
    pub async fn list_page(
        db: &SqlitePool,
        user_id: Uuid,
        parent_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<FileNode>> {
        let rows = sqlx::query_as::<_, FileNode>(
            r#"
            SELECT id, user_id, name, kind, is_public, parent_id, local_path, created_at
            FROM files
            WHERE user_id = ? AND parent_id IS ?
            ORDER BY created_at ASC, rowid ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(parent_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn set_public(
        db: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        is_public: bool,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE files SET is_public = ? WHERE id = ? AND user_id = ?")
            .bind(is_public)
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn count(db: &SqlitePool) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
            .fetch_one(db)
            .await?;
        Ok(count)
    }
}
