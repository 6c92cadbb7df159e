use std::io::Cursor;

use anyhow::Context;
use image::{imageops::FilterType, DynamicImage};
use tokio::sync::mpsc;
use tracing::{error, info, instrument};

use crate::files::repo::FileNode;
use crate::state::AppState;

use super::{ThumbnailJob, THUMBNAIL_WIDTHS};

/// Consume the job queue until it closes, one job at a time.
///
/// A failed job is reported and dropped; there is no automatic retry. Jobs
/// are idempotent (derivation is deterministic per source bytes), so a
/// re-enqueued job simply overwrites whatever a partial run left behind.
pub async fn run(state: AppState, mut jobs: mpsc::UnboundedReceiver<ThumbnailJob>) {
    info!("thumbnail worker started");
    while let Some(job) = jobs.recv().await {
        let file_id = job.file_id;
        if let Err(e) = process(&state, job).await {
            error!(%file_id, error = %e, "thumbnail job failed");
        }
    }
    info!("thumbnail queue closed, worker stopping");
}

/// Derive and persist all configured sizes for one job.
#[instrument(skip(state), fields(file_id = %job.file_id))]
pub async fn process(state: &AppState, job: ThumbnailJob) -> anyhow::Result<()> {
    let node = FileNode::find_owned(&state.db, job.file_id, job.user_id)
        .await?
        .context("file not found")?;
    let source = node.local_path.as_deref().context("file has no content")?;
    let bytes = state
        .blobs
        .read(source)
        .await?
        .with_context(|| format!("blob missing at {source}"))?;

    // Keep the source encoding for the derived copies.
    let format = image::guess_format(&bytes).context("unrecognized image format")?;
    let img = image::load_from_memory(&bytes).context("decode image")?;

    for width in THUMBNAIL_WIDTHS {
        let thumb = resize_to_width(&img, width);
        let mut buf = Cursor::new(Vec::new());
        thumb
            .write_to(&mut buf, format)
            .with_context(|| format!("encode {width}px thumbnail"))?;
        state
            .blobs
            .write_at(&format!("{source}_{width}"), buf.into_inner().into())
            .await?;
    }

    info!("thumbnails generated");
    Ok(())
}

/// Resize to the given width, preserving the aspect ratio.
fn resize_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    let src_w = u64::from(img.width().max(1));
    let height = (u64::from(width) * u64::from(img.height()) / src_w).max(1) as u32;
    img.resize_exact(width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;
    use crate::files::repo::FileKind;
    use crate::thumbs::ThumbnailQueue;
    use image::{ImageFormat, RgbaImage};
    use tempfile::TempDir;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 200, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn resize_preserves_aspect_ratio() {
        let img = DynamicImage::new_rgba8(800, 400);
        let thumb = resize_to_width(&img, 100);
        assert_eq!((thumb.width(), thumb.height()), (100, 50));

        let tall = DynamicImage::new_rgba8(200, 600);
        let thumb = resize_to_width(&tall, 100);
        assert_eq!((thumb.width(), thumb.height()), (100, 300));
    }

    #[test]
    fn resize_never_collapses_to_zero_height() {
        let wide = DynamicImage::new_rgba8(1000, 1);
        let thumb = resize_to_width(&wide, 100);
        assert_eq!((thumb.width(), thumb.height()), (100, 1));
    }

    async fn seeded_image_node(state: &AppState) -> FileNode {
        let user = User::create(&state.db, "worker@test.dev", "hash").await.unwrap();
        let path = state
            .blobs
            .write(&Uuid::new_v4().to_string(), png_bytes(800, 400).into())
            .await
            .unwrap();
        let node = FileNode {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: "cat.png".into(),
            kind: FileKind::Image,
            is_public: false,
            parent_id: None,
            local_path: Some(path),
            created_at: OffsetDateTime::now_utc(),
        };
        FileNode::insert(&state.db, &node).await.unwrap();
        node
    }

    #[tokio::test]
    async fn process_writes_all_configured_widths() {
        let dir = TempDir::new().unwrap();
        let (queue, _rx) = ThumbnailQueue::new();
        let state = AppState::in_memory(dir.path(), queue).await.unwrap();
        let node = seeded_image_node(&state).await;
        let source = node.local_path.clone().unwrap();

        process(
            &state,
            ThumbnailJob {
                file_id: node.id,
                user_id: node.user_id,
            },
        )
        .await
        .unwrap();

        for width in THUMBNAIL_WIDTHS {
            let bytes = state
                .blobs
                .read(&format!("{source}_{width}"))
                .await
                .unwrap()
                .expect("thumbnail written");
            let thumb = image::load_from_memory(&bytes).unwrap();
            assert_eq!(thumb.width(), width);
            assert_eq!(thumb.height(), width / 2);
        }
    }

    #[tokio::test]
    async fn process_fails_for_unknown_or_foreign_file() {
        let dir = TempDir::new().unwrap();
        let (queue, _rx) = ThumbnailQueue::new();
        let state = AppState::in_memory(dir.path(), queue).await.unwrap();
        let node = seeded_image_node(&state).await;

        // Unknown file id.
        let err = process(
            &state,
            ThumbnailJob {
                file_id: Uuid::new_v4(),
                user_id: node.user_id,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("file not found"));

        // Ownership mismatch is indistinguishable from a missing file.
        let err = process(
            &state,
            ThumbnailJob {
                file_id: node.id,
                user_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[tokio::test]
    async fn process_fails_when_blob_is_gone() {
        let dir = TempDir::new().unwrap();
        let (queue, _rx) = ThumbnailQueue::new();
        let state = AppState::in_memory(dir.path(), queue).await.unwrap();
        let node = seeded_image_node(&state).await;

        tokio::fs::remove_file(node.local_path.as_deref().unwrap())
            .await
            .unwrap();

        let err = process(
            &state,
            ThumbnailJob {
                file_id: node.id,
                user_id: node.user_id,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("blob missing"));
    }
}
