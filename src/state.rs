use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::sessions::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::storage::{BlobStore, DiskBlobStore};
use crate::thumbs::ThumbnailQueue;

pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub thumbs: ThumbnailQueue,
}

impl AppState {
    /// Wire up the production backends from the environment.
    ///
    /// The thumbnail queue is created by the caller so the matching receiver
    /// can be handed to the worker task.
    pub async fn init(thumbs: ThumbnailQueue) -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env());

        let opts = SqliteConnectOptions::from_str(&config.database_url)
            .context("parse DATABASE_URL")?
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .context("connect to database")?;

        let sessions =
            Arc::new(RedisSessionStore::new(&config.redis_url)?) as Arc<dyn SessionStore>;
        let blobs =
            Arc::new(DiskBlobStore::new(config.folder_path.clone())) as Arc<dyn BlobStore>;

        Ok(Self {
            db,
            config,
            sessions,
            blobs,
            thumbs,
        })
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        sessions: Arc<dyn SessionStore>,
        blobs: Arc<dyn BlobStore>,
        thumbs: ThumbnailQueue,
    ) -> Self {
        Self {
            db,
            config,
            sessions,
            blobs,
            thumbs,
        }
    }

    /// Self-contained state for tests: in-memory database and sessions, blobs
    /// under the given directory.
    pub async fn in_memory(folder: &Path, thumbs: ThumbnailQueue) -> anyhow::Result<Self> {
        // A pooled in-memory SQLite database lives and dies with its single
        // connection, so the pool must never open a second one or drop it.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("open in-memory database")?;
        MIGRATOR.run(&db).await.context("run migrations")?;

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            redis_url: "redis://127.0.0.1:6379".into(),
            folder_path: folder.to_path_buf(),
            session_ttl: Duration::from_secs(60 * 60),
            host: "127.0.0.1".into(),
            port: 0,
        });

        Ok(Self {
            db,
            config,
            sessions: Arc::new(MemorySessionStore::new()),
            blobs: Arc::new(DiskBlobStore::new(folder.to_path_buf())),
            thumbs,
        })
    }
}
