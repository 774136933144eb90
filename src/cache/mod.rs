//! Read-through cache for listing search results.
//!
//! The backing store is abstracted behind [`CacheBackend`] so the service
//! only depends on three primitives: keyed get, keyed put with a TTL, and
//! bulk delete by namespace prefix. The last one is what write-invalidation
//! uses instead of wildcard key deletion.
//!
//! The cache is strictly best-effort: a backend failure is logged and the
//! request falls through to the loader. Loader failures are propagated and
//! never cached.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove every entry whose key starts with `prefix`, returning how many
    /// were deleted.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64>;
}

#[derive(Clone)]
pub struct SearchCache {
    backend: Arc<dyn CacheBackend>,
    enabled: bool,
}

impl SearchCache {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, enabled: bool) -> Self {
        Self { backend, enabled }
    }

    /// Return the cached value for `key` if present and unexpired; otherwise
    /// invoke `loader` exactly once, store its result under `key` with `ttl`,
    /// and return it.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.enabled {
            return loader().await;
        }

        match self.backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    metrics::counter!("search_cache_hits_total").increment(1);
                    debug!(key, "search cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(key, "deleting undecodable cache entry: {e}");
                    if let Err(e) = self.backend.delete_prefix(key).await {
                        warn!(key, "failed to delete undecodable cache entry: {e}");
                    }
                }
            },
            Ok(None) => {}
            Err(e) => {
                metrics::counter!("search_cache_errors_total").increment(1);
                warn!(key, "cache backend unavailable, reading store directly: {e}");
            }
        }

        metrics::counter!("search_cache_misses_total").increment(1);
        let value = loader().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.backend.put(key, &raw, ttl).await {
                    warn!(key, "failed to store cache entry: {e}");
                }
            }
            Err(e) => warn!(key, "failed to serialize cache entry: {e}"),
        }

        Ok(value)
    }

    /// Drop every entry under `prefix`. Failures are logged, not surfaced:
    /// staleness stays bounded by the entry TTL either way.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        if !self.enabled {
            return;
        }
        match self.backend.delete_prefix(prefix).await {
            Ok(removed) => {
                debug!(prefix, removed, "invalidated cached search results");
            }
            Err(e) => {
                metrics::counter!("search_cache_errors_total").increment(1);
                warn!(prefix, "cache invalidation failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[derive(Default)]
    struct MemoryBackend {
        entries: Mutex<HashMap<String, (String, Instant)>>,
    }

    #[async_trait]
    impl CacheBackend for MemoryBackend {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            let entries = self.entries.lock().unwrap();
            Ok(entries
                .get(key)
                .filter(|(_, deadline)| *deadline > Instant::now())
                .map(|(raw, _)| raw.clone()))
        }

        async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
            Ok(())
        }

        async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|key, _| !key.starts_with(prefix));
            Ok((before - entries.len()) as u64)
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CacheBackend for FailingBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            anyhow::bail!("connection refused")
        }

        async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            anyhow::bail!("connection refused")
        }

        async fn delete_prefix(&self, _prefix: &str) -> Result<u64> {
            anyhow::bail!("connection refused")
        }
    }

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_second_read_is_a_hit() {
        let cache = SearchCache::new(Arc::new(MemoryBackend::default()), true);
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let value: u32 = cache
                .get_or_load("k", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reloads() {
        let cache = SearchCache::new(Arc::new(MemoryBackend::default()), true);
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let _: u32 = cache
                .get_or_load("k", Duration::ZERO, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loader_failure_is_not_cached() {
        let cache = SearchCache::new(Arc::new(MemoryBackend::default()), true);

        let result: Result<u32> = cache
            .get_or_load("k", TTL, || async { anyhow::bail!("store down") })
            .await;
        assert!(result.is_err());

        // Next call must reach the loader again.
        let value: u32 = cache.get_or_load("k", TTL, || async { Ok(9) }).await.unwrap();
        assert_eq!(value, 9);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_deleted() {
        let backend = Arc::new(MemoryBackend::default());
        let cache = SearchCache::new(backend.clone(), true);

        backend.put("k", "not-json", TTL).await.unwrap();

        // A failing loader must not leave the garbage entry behind.
        let result: Result<u32> = cache
            .get_or_load("k", TTL, || async { anyhow::bail!("store down") })
            .await;
        assert!(result.is_err());
        assert!(backend.get("k").await.unwrap().is_none());

        let value: u32 = cache.get_or_load("k", TTL, || async { Ok(4) }).await.unwrap();
        assert_eq!(value, 4);
    }

    #[tokio::test]
    async fn test_backend_outage_degrades_to_loader() {
        let cache = SearchCache::new(Arc::new(FailingBackend), true);
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let value: u32 = cache
                .get_or_load("k", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(3)
                })
                .await
                .unwrap();
            assert_eq!(value, 3);
        }

        // No caching possible, but every request still succeeded.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_prefix_is_scoped() {
        let backend = Arc::new(MemoryBackend::default());
        let cache = SearchCache::new(backend.clone(), true);

        backend.put("search:a", "1", TTL).await.unwrap();
        backend.put("search:b", "2", TTL).await.unwrap();
        backend.put("other:c", "3", TTL).await.unwrap();

        cache.invalidate_prefix("search:").await;

        assert!(backend.get("search:a").await.unwrap().is_none());
        assert!(backend.get("search:b").await.unwrap().is_none());
        assert_eq!(backend.get("other:c").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_invalidation_failure_does_not_panic_or_error() {
        let cache = SearchCache::new(Arc::new(FailingBackend), true);
        cache.invalidate_prefix("search:").await;
    }

    #[tokio::test]
    async fn test_disabled_cache_always_loads() {
        let backend = Arc::new(MemoryBackend::default());
        let cache = SearchCache::new(backend.clone(), false);
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let _: u32 = cache
                .get_or_load("k", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(backend.entries.lock().unwrap().is_empty());
    }
}
