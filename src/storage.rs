use std::io;
use std::path::PathBuf;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

/// Raw blob storage keyed by generated identifiers.
///
/// Blobs live flat under a storage root; derived artifacts (thumbnails) are
/// co-located next to their source as `<path>_<width>`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a new blob under the storage root, returning its full path.
    async fn write(&self, blob_id: &str, body: Bytes) -> anyhow::Result<String>;

    /// Write bytes to an explicit path (used for derived artifacts).
    async fn write_at(&self, path: &str, body: Bytes) -> anyhow::Result<()>;

    /// Read a blob by path. `None` when the file does not exist.
    async fn read(&self, path: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Local-filesystem blob store.
#[derive(Debug, Clone)]
pub struct DiskBlobStore {
    root: PathBuf,
}

impl DiskBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn write(&self, blob_id: &str, body: Bytes) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create storage root {}", self.root.display()))?;
        let path = self.root.join(blob_id);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write blob {}", path.display()))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn write_at(&self, path: &str, body: Bytes) -> anyhow::Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        tokio::fs::write(path, &body)
            .await
            .with_context(|| format!("write blob {path}"))?;
        Ok(())
    }

    async fn read(&self, path: &str) -> anyhow::Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read blob {path}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_and_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path().to_path_buf());

        let path = store
            .write("blob-1", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert!(path.starts_with(&dir.path().to_string_lossy().into_owned()));

        let bytes = store.read(&path).await.unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"hello"[..]));
    }

    #[tokio::test]
    async fn write_creates_root_recursively() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = DiskBlobStore::new(nested);

        assert!(!store.root().exists());
        store
            .write("blob-2", Bytes::from_static(b"data"))
            .await
            .unwrap();
        assert!(store.root().exists());
    }

    #[tokio::test]
    async fn read_missing_blob_is_none() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path().to_path_buf());

        let missing = dir.path().join("nope");
        let bytes = store.read(&missing.to_string_lossy()).await.unwrap();
        assert!(bytes.is_none());
    }

    #[tokio::test]
    async fn write_at_places_derived_artifacts_next_to_source() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path().to_path_buf());

        let source = store
            .write("blob-3", Bytes::from_static(b"source"))
            .await
            .unwrap();
        let derived = format!("{source}_100");
        store
            .write_at(&derived, Bytes::from_static(b"thumb"))
            .await
            .unwrap();

        assert_eq!(
            store.read(&derived).await.unwrap().as_deref(),
            Some(&b"thumb"[..])
        );
        // Source untouched.
        assert_eq!(
            store.read(&source).await.unwrap().as_deref(),
            Some(&b"source"[..])
        );
    }
}
