use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use uuid::Uuid;

use super::{new_token, session_key, SessionStore};

/// Redis-backed session store using a `deadpool-redis` connection pool.
///
/// TTLs are enforced by Redis itself (`SET ... EX`), so expired tokens
/// disappear without any sweeping on our side.
pub struct RedisSessionStore {
    pool: Pool,
}

impl RedisSessionStore {
    /// Create a store from a `redis://` URL. The pool is lazy: no connection
    /// is made until the first command, so startup succeeds with Redis down
    /// and `GET /status` reports it instead.
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .context("create redis pool")?;
        Ok(Self { pool })
    }

    async fn conn(&self) -> anyhow::Result<deadpool_redis::Connection> {
        self.pool.get().await.context("redis connection")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn issue(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<String> {
        let token = new_token();
        let mut conn = self.conn().await?;
        let () = conn
            .set_ex(
                session_key(&token),
                user_id.to_string(),
                ttl.as_secs().max(1),
            )
            .await
            .context("store session")?;
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn
            .get(session_key(token))
            .await
            .context("resolve session")?;
        Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
    }

    async fn revoke(&self, token: &str) -> anyhow::Result<bool> {
        let mut conn = self.conn().await?;
        let deleted: i64 = conn
            .del(session_key(token))
            .await
            .context("revoke session")?;
        Ok(deleted > 0)
    }

    async fn ping(&self) -> bool {
        let Ok(mut conn) = self.pool.get().await else {
            return false;
        };
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
