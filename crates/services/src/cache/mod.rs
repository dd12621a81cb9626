//! Cache abstraction used by the read paths.
//!
//! The cache is an injected collaborator, never ambient state: services only
//! see the four operations of the [`Cache`] trait plus the error-absorbing
//! [`CacheLayer`] wrapper. A slow or broken cache backend degrades a read to
//! a direct store computation; it never fails a request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

pub mod keys;
mod memory;

pub use memory::InMemoryCache;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache operation timed out")]
    Timeout,

    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Key/value store with per-entry TTL and prefix deletion.
///
/// Values are opaque strings; services encode their shapes as JSON before
/// they reach the backend.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a value; `Ok(None)` on miss or expired entry.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend fails.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value with a time-to-live.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend fails.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Drop one entry. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend fails.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every entry whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backend fails.
    async fn delete_prefix(&self, prefix: &str) -> Result<(), CacheError>;
}

/// Tuning for the cache layer.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied to every entry written through the layer.
    pub entry_ttl: Duration,
    /// Upper bound on any single backend call; a timeout counts as a miss.
    pub op_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(300),
            op_timeout: Duration::from_millis(250),
        }
    }
}

/// Typed, error-absorbing wrapper around a [`Cache`] backend.
///
/// Every method swallows backend failures: a failed `get` is a miss, a
/// failed `set` or eviction is logged and dropped. TTL bounds the staleness
/// a dropped eviction can cause.
#[derive(Clone)]
pub struct CacheLayer {
    backend: Arc<dyn Cache>,
    config: CacheConfig,
}

impl CacheLayer {
    #[must_use]
    pub fn new(backend: Arc<dyn Cache>) -> Self {
        Self {
            backend,
            config: CacheConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.config.op_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout),
        }
    }

    /// Fetch and decode an entry; any failure reads as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.bounded(self.backend.get(key)).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key, error = %err, "cache get failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                // A corrupt entry would otherwise wedge the key until TTL.
                warn!(key, error = %err, "cache entry failed to decode, evicting");
                self.evict(key).await;
                None
            }
        }
    }

    /// Encode and store an entry under the configured TTL.
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "cache value failed to encode, skipping populate");
                return;
            }
        };

        if let Err(err) = self
            .bounded(self.backend.set(key, raw, self.config.entry_ttl))
            .await
        {
            warn!(key, error = %err, "cache set failed, skipping populate");
        }
    }

    /// Drop one entry, absorbing backend failures.
    pub async fn evict(&self, key: &str) {
        if let Err(err) = self.bounded(self.backend.delete(key)).await {
            warn!(key, error = %err, "cache delete failed");
        }
    }

    /// Drop a whole namespace, absorbing backend failures.
    pub async fn evict_prefix(&self, prefix: &str) {
        if let Err(err) = self.bounded(self.backend.delete_prefix(prefix)).await {
            warn!(prefix, error = %err, "cache prefix delete failed");
        }
    }
}
