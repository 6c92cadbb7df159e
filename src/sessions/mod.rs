//! Token-to-user session storage with fixed expiry.
//!
//! Tokens are opaque UUIDv4 strings stored under `auth_<token>`. Expiry is
//! fixed from issuance; `resolve` never refreshes the TTL.

use std::time::Duration;

use axum::async_trait;
use uuid::Uuid;

mod memory;
mod redis;

pub use memory::MemorySessionStore;
pub use redis::RedisSessionStore;

pub(crate) fn session_key(token: &str) -> String {
    format!("auth_{token}")
}

pub(crate) fn new_token() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a fresh token for `user_id` with the given TTL and return it.
    async fn issue(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<String>;

    /// Look up the user behind a token. `None` after expiry or revocation.
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Uuid>>;

    /// Delete the mapping. `false` when the token was already absent.
    async fn revoke(&self, token: &str) -> anyhow::Result<bool>;

    /// Backend liveness, surfaced by `GET /status`.
    async fn ping(&self) -> bool;
}
