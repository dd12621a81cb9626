use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Cache, CacheError};

/// Cache entry with expiry tracking.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache backend.
///
/// Entries expire lazily on read; callers that care about memory growth can
/// schedule [`InMemoryCache::purge_expired`] periodically. Suitable for
/// single-process deployments and tests; a shared deployment would put a
/// networked backend behind the same [`Cache`] trait instead.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries, for tests and monitoring.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// True when no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| !e.is_expired(now));
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.to_owned(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_roundtrip() {
        let cache = InMemoryCache::new();
        cache
            .set("a", "1".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.get("b").await.unwrap(), None);

        cache.delete("a").await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);

        // Deleting a missing key is a no-op, not an error.
        cache.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn expired_entries_read_as_misses() {
        let cache = InMemoryCache::new();
        cache
            .set("a", "1".into(), Duration::from_nanos(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(cache.get("a").await.unwrap(), None);
        assert!(cache.is_empty().await);

        cache.purge_expired().await;
        let entries = cache.entries.read().await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn delete_prefix_drops_a_namespace_only() {
        let cache = InMemoryCache::new();
        for key in ["ns:1:a", "ns:1:b", "ns:2:a", "other:1"] {
            cache
                .set(key, "x".into(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        cache.delete_prefix("ns:1:").await.unwrap();

        assert_eq!(cache.get("ns:1:a").await.unwrap(), None);
        assert_eq!(cache.get("ns:1:b").await.unwrap(), None);
        assert!(cache.get("ns:2:a").await.unwrap().is_some());
        assert!(cache.get("other:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn set_overwrites_and_refreshes_ttl() {
        let cache = InMemoryCache::new();
        cache
            .set("a", "old".into(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("a", "new".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some("new".to_string()));
        assert_eq!(cache.len().await, 1);
    }
}
