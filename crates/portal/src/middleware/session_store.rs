//! Session persistence backends.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::AppResult;

use super::cache::Cache;
use super::session::SessionData;

/// Cache key prefix for sessions
const CACHE_PREFIX_SESSION: &str = "session:";

/// Storage for session records keyed by the opaque cookie value.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live session, `None` when unknown or expired.
    async fn load(&self, id: &str) -> AppResult<Option<SessionData>>;

    /// Store a session under a fresh id. Returns `false` if the id is taken.
    async fn create(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> AppResult<bool>;

    /// Replace a live session and reset its lifetime. Returns `false` when the
    /// record is gone, e.g. destroyed by a concurrent logout.
    async fn update(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> AppResult<bool>;

    async fn destroy(&self, id: &str) -> AppResult<()>;

    /// Check backend connectivity
    async fn ping(&self) -> AppResult<()>;
}

// =============================================================================
// Redis
// =============================================================================

/// Sessions stored as JSON under `session:<id>` with `EX` expiry.
pub struct RedisSessionStore {
    cache: Cache,
}

impl RedisSessionStore {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    fn key(id: &str) -> String {
        format!("{}{}", CACHE_PREFIX_SESSION, id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> AppResult<Option<SessionData>> {
        self.cache.get(&Self::key(id)).await
    }

    async fn create(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> AppResult<bool> {
        self.cache.set_if_absent(&Self::key(id), data, ttl_seconds).await
    }

    async fn update(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> AppResult<bool> {
        self.cache.set_if_present(&Self::key(id), data, ttl_seconds).await
    }

    async fn destroy(&self, id: &str) -> AppResult<()> {
        self.cache.delete(&Self::key(id)).await
    }

    async fn ping(&self) -> AppResult<()> {
        self.cache.ping().await
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Process-local session store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (SessionData, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> AppResult<Option<SessionData>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(data, _)| data.clone()))
    }

    async fn create(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> AppResult<bool> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, at)| *at > now);
        if sessions.contains_key(id) {
            return Ok(false);
        }
        let expires = now + Duration::from_secs(ttl_seconds);
        sessions.insert(id.to_string(), (data.clone(), expires));
        Ok(true)
    }

    async fn update(&self, id: &str, data: &SessionData, ttl_seconds: u64) -> AppResult<bool> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, at)| *at > now);
        match sessions.get_mut(id) {
            Some(entry) => {
                *entry = (data.clone(), now + Duration::from_secs(ttl_seconds));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn destroy(&self, id: &str) -> AppResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::UserRole;
    use uuid::Uuid;

    fn authenticated() -> SessionData {
        SessionData {
            user_id: Some(Uuid::new_v4()),
            role: Some(UserRole::Patient),
            flashes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let store = MemorySessionStore::new();
        let data = authenticated();

        assert!(store.create("abc", &data, 60).await.unwrap());
        let loaded = store.load("abc").await.unwrap().unwrap();
        assert_eq!(loaded.user_id, data.user_id);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_refuses_taken_id() {
        let store = MemorySessionStore::new();
        let first = authenticated();
        store.create("abc", &first, 60).await.unwrap();

        assert!(!store.create("abc", &authenticated(), 60).await.unwrap());
        let loaded = store.load("abc").await.unwrap().unwrap();
        assert_eq!(loaded.user_id, first.user_id);
    }

    #[tokio::test]
    async fn test_update_replaces_live_session() {
        let store = MemorySessionStore::new();
        store.create("abc", &authenticated(), 60).await.unwrap();

        let replacement = authenticated();
        assert!(store.update("abc", &replacement, 60).await.unwrap());
        let loaded = store.load("abc").await.unwrap().unwrap();
        assert_eq!(loaded.user_id, replacement.user_id);
    }

    #[tokio::test]
    async fn test_update_after_destroy_writes_nothing() {
        let store = MemorySessionStore::new();
        store.create("abc", &authenticated(), 60).await.unwrap();
        store.destroy("abc").await.unwrap();

        assert!(!store.update("abc", &authenticated(), 60).await.unwrap());
        assert!(store.load("abc").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_session_is_gone() {
        let store = MemorySessionStore::new();
        store.create("abc", &authenticated(), 0).await.unwrap();
        assert!(store.load("abc").await.unwrap().is_none());
        assert!(store.is_empty().await);
        assert!(!store.update("abc", &authenticated(), 60).await.unwrap());
    }

    #[tokio::test]
    async fn test_destroy() {
        let store = MemorySessionStore::new();
        store.create("abc", &authenticated(), 60).await.unwrap();
        store.destroy("abc").await.unwrap();
        assert!(store.load("abc").await.unwrap().is_none());
        tokio_test::assert_ok!(store.destroy("never-existed").await);
    }
}
