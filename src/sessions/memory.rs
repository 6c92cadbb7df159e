use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::async_trait;
use uuid::Uuid;

use super::{new_token, session_key, SessionStore};

/// In-process session store for tests and single-node deployments.
///
/// Entries expire lazily: an expired token is dropped the first time it is
/// looked up after its deadline.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, (Uuid, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn issue(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<String> {
        let token = new_token();
        let mut entries = self.entries.lock().expect("session store poisoned");
        entries.insert(session_key(&token), (user_id, Instant::now() + ttl));
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        let key = session_key(token);
        let mut entries = self.entries.lock().expect("session store poisoned");
        match entries.get(&key) {
            Some((user_id, deadline)) if *deadline > Instant::now() => Ok(Some(*user_id)),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn revoke(&self, token: &str) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().expect("session store poisoned");
        Ok(entries.remove(&session_key(token)).is_some())
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(60 * 60 * 24);

    #[tokio::test]
    async fn issue_then_resolve_returns_same_user() {
        let store = MemorySessionStore::new();
        let user_id = Uuid::new_v4();

        let token = store.issue(user_id, DAY).await.unwrap();
        assert_eq!(store.resolve(&token).await.unwrap(), Some(user_id));
    }

    #[tokio::test]
    async fn revoke_makes_token_absent() {
        let store = MemorySessionStore::new();
        let token = store.issue(Uuid::new_v4(), DAY).await.unwrap();

        assert!(store.revoke(&token).await.unwrap());
        assert_eq!(store.resolve(&token).await.unwrap(), None);
        // Revoking again is not an error, just a no-op.
        assert!(!store.revoke(&token).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_token_is_absent() {
        let store = MemorySessionStore::new();
        assert_eq!(store.resolve("no-such-token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn token_expires_after_ttl() {
        let store = MemorySessionStore::new();
        let token = store
            .issue(Uuid::new_v4(), Duration::from_millis(30))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.resolve(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn resolve_does_not_extend_the_ttl() {
        let store = MemorySessionStore::new();
        let token = store
            .issue(Uuid::new_v4(), Duration::from_millis(80))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.resolve(&token).await.unwrap().is_some());

        // Expiry is fixed from issuance, so the earlier lookup buys nothing.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.resolve(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn tokens_are_unique_per_issue() {
        let store = MemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let a = store.issue(user_id, DAY).await.unwrap();
        let b = store.issue(user_id, DAY).await.unwrap();
        assert_ne!(a, b);
    }
}
