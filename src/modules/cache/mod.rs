//! Tag-invalidated cache for read queries.
//!
//! Every cached read is registered under a tag (the resource family name).
//! Mutations invalidate the whole tag, since list and stats reads aggregate
//! across the family. Each tag carries a generation counter that is part of
//! the stored key: invalidation bumps the counter, which makes every older
//! entry unreachable, and moka's TTL and capacity bound evict them. A read
//! that started before an invalidation is not allowed to repopulate the
//! cache with what it loaded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::config::CacheConfig;
use crate::core::error::Result;

#[derive(Clone)]
pub struct QueryCache {
    inner: Option<Arc<QueryCacheInner>>,
}

struct QueryCacheInner {
    entries: Cache<String, String>,
    /// Current generation per tag; one counter per tag, never per key
    generations: Mutex<HashMap<String, u64>>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let entries = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();

        Self {
            inner: Some(Arc::new(QueryCacheInner {
                entries,
                generations: Mutex::new(HashMap::new()),
            })),
        }
    }

    /// A cache that never stores anything; every read goes to the loader.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    fn full_key(tag: &str, generation: u64, key: &str) -> String {
        format!("{tag}:{generation}:{key}")
    }

    /// Current generation of a tag. Bumped by every invalidation.
    pub async fn generation(&self, tag: &str) -> u64 {
        let Some(inner) = &self.inner else {
            return 0;
        };
        let generations = inner.generations.lock().await;
        generations.get(tag).copied().unwrap_or(0)
    }

    pub async fn get<T: DeserializeOwned>(&self, tag: &str, key: &str) -> Option<T> {
        let inner = self.inner.as_ref()?;
        let full_key = Self::full_key(tag, self.generation(tag).await, key);
        let raw = inner.entries.get(&full_key).await?;

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %full_key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(error = %e, key = %full_key, "dropping undecodable cache entry");
                inner.entries.invalidate(&full_key).await;
                None
            }
        }
    }

    /// Store a value loaded while the tag was at `observed_generation`.
    /// Skipped when the tag has been invalidated since.
    pub async fn insert<T: Serialize>(
        &self,
        tag: &str,
        key: &str,
        value: &T,
        observed_generation: u64,
    ) {
        let Some(inner) = &self.inner else {
            return;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, tag = %tag, key = %key, "failed to serialize cache value");
                return;
            }
        };

        let full_key = Self::full_key(tag, observed_generation, key);
        // held across the insert so an invalidation cannot slip in between
        let generations = inner.generations.lock().await;
        if generations.get(tag).copied().unwrap_or(0) != observed_generation {
            debug!(key = %full_key, "skipping cache fill from before invalidation");
            return;
        }

        inner.entries.insert(full_key, raw).await;
    }

    /// Return the cached value for `(tag, key)` or run `load` and cache it.
    /// Loader errors are returned as-is and never cached.
    pub async fn get_or_load<T, F, Fut>(&self, tag: &str, key: &str, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get::<T>(tag, key).await {
            return Ok(hit);
        }

        let generation = self.generation(tag).await;
        let value = load().await?;
        self.insert(tag, key, &value, generation).await;
        Ok(value)
    }

    /// Drop every cached read registered under `tag`.
    pub async fn invalidate_tag(&self, tag: &str) {
        let Some(inner) = &self.inner else {
            return;
        };

        let mut generations = inner.generations.lock().await;
        let generation = generations.entry(tag.to_string()).or_default();
        *generation += 1;

        debug!(tag = %tag, generation = *generation, "tag invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn enabled() -> QueryCache {
        QueryCache::new(&CacheConfig {
            enabled: true,
            ttl_secs: 60,
            max_capacity: 100,
        })
    }

    async fn counted_load(calls: &AtomicUsize, value: i64) -> Result<i64> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn test_get_or_load_caches() {
        let cache = enabled();
        let calls = AtomicUsize::new(0);

        let a = cache
            .get_or_load("services", "stats", || counted_load(&calls, 7))
            .await
            .unwrap();
        let b = cache
            .get_or_load("services", "stats", || counted_load(&calls, 8))
            .await
            .unwrap();

        assert_eq!(a, 7);
        assert_eq!(b, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_tag_forces_reload() {
        let cache = enabled();
        let calls = AtomicUsize::new(0);

        cache
            .get_or_load("services", "list:a", || counted_load(&calls, 1))
            .await
            .unwrap();
        cache
            .get_or_load("services", "list:b", || counted_load(&calls, 2))
            .await
            .unwrap();
        cache
            .get_or_load("listings", "list:a", || counted_load(&calls, 3))
            .await
            .unwrap();

        cache.invalidate_tag("services").await;

        assert_eq!(cache.get::<i64>("services", "list:a").await, None);
        assert_eq!(cache.get::<i64>("services", "list:b").await, None);
        // other tags are untouched
        assert_eq!(cache.get::<i64>("listings", "list:a").await, Some(3));
    }

    #[tokio::test]
    async fn test_stale_fill_is_discarded() {
        let cache = enabled();
        let observed = cache.generation("services").await;

        cache.invalidate_tag("services").await;
        cache.insert("services", "stats", &42i64, observed).await;

        assert_eq!(cache.get::<i64>("services", "stats").await, None);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_grow_bookkeeping() {
        let cache = QueryCache::new(&CacheConfig {
            enabled: true,
            ttl_secs: 1,
            max_capacity: 10,
        });
        let calls = AtomicUsize::new(0);

        for i in 0..5000 {
            cache
                .get_or_load("services", &format!("list:q={i}"), || counted_load(&calls, i))
                .await
                .unwrap();
        }
        cache.invalidate_tag("listings").await;

        let inner = cache.inner.as_ref().unwrap();
        inner.entries.run_pending_tasks().await;
        assert!(inner.entries.entry_count() <= 10);
        assert_eq!(inner.generations.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_reads_after_invalidation_reload_and_cache_again() {
        let cache = enabled();
        let calls = AtomicUsize::new(0);

        cache
            .get_or_load("services", "stats", || counted_load(&calls, 1))
            .await
            .unwrap();
        cache.invalidate_tag("services").await;

        let reloaded = cache
            .get_or_load("services", "stats", || counted_load(&calls, 2))
            .await
            .unwrap();
        let cached = cache
            .get_or_load("services", "stats", || counted_load(&calls, 3))
            .await
            .unwrap();

        assert_eq!(reloaded, 2);
        assert_eq!(cached, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loader_errors_not_cached() {
        let cache = enabled();
        let result: Result<i64> = cache
            .get_or_load("services", "stats", || async {
                Err(crate::core::error::AppError::Internal("boom".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get::<i64>("services", "stats").await, None);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_loads() {
        let cache = QueryCache::disabled();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_load("services", "stats", || counted_load(&calls, 1))
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
