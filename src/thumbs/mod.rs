//! Asynchronous thumbnail derivation.
//!
//! Uploading an image enqueues a [`ThumbnailJob`]; a worker task consumes
//! the queue and writes resized copies next to the source blob. The queue is
//! fire-and-forget: enqueue failures degrade the thumbnail feature but never
//! fail the upload that produced the job.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

pub mod worker;

/// Widths of the derived copies, written as `<local_path>_<width>`.
pub const THUMBNAIL_WIDTHS: [u32; 3] = [500, 250, 100];

/// One unit of asynchronous work: derive thumbnails for an owned image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailJob {
    pub file_id: Uuid,
    pub user_id: Uuid,
}

/// Producer handle for the thumbnail queue.
///
/// Held by [`crate::state::AppState`] and cloned into request handlers; the
/// matching receiver is consumed by [`worker::run`].
#[derive(Clone)]
pub struct ThumbnailQueue {
    tx: mpsc::UnboundedSender<ThumbnailJob>,
}

impl ThumbnailQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ThumbnailJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire-and-forget enqueue. A closed queue (worker gone) is logged and
    /// otherwise ignored; the caller's write has already been persisted.
    pub fn enqueue(&self, job: ThumbnailJob) {
        if let Err(e) = self.tx.send(job) {
            warn!(file_id = %e.0.file_id, "thumbnail queue closed, job dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueued_jobs_arrive_in_order() {
        let (queue, mut rx) = ThumbnailQueue::new();
        let first = ThumbnailJob {
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };
        let second = ThumbnailJob {
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };

        queue.enqueue(first.clone());
        queue.enqueue(second.clone());

        assert_eq!(rx.recv().await, Some(first));
        assert_eq!(rx.recv().await, Some(second));
    }

    #[tokio::test]
    async fn enqueue_on_closed_queue_does_not_panic() {
        let (queue, rx) = ThumbnailQueue::new();
        drop(rx);
        queue.enqueue(ThumbnailJob {
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        });
    }
}
