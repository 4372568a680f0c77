//! Per-provider LRU+TTL response cache (C2).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use oracle_core::{Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
#[cfg(feature = "tracing")]
use tracing::debug;

/// Cache key for a single provider's response cache.
///
/// Per the caching-correctness design note, only the fields that affect a
/// *single provider's* answer belong here: the query text. Router-level
/// options (`sources`, `consensusMethod`) never reach an individual provider
/// and so are never part of this key; `timeout`/`cacheTime` govern whether a
/// cache entry is accepted, not which entry is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
}

/// Wraps any `Provider` with a `moka`-backed LRU cache bounded by capacity
/// and TTL. A live entry younger than the caller's requested `cache_time`
/// (or the configured default TTL, whichever is smaller) is returned without
/// invoking the inner provider or touching its metrics, per the provider
/// contract's caching carve-out.
pub struct CacheMiddleware<P: Provider> {
    inner: Arc<P>,
    cache: Cache<CacheKey, (Response, std::time::Instant)>,
    default_ttl: Duration,
}

impl<P: Provider> CacheMiddleware<P> {
    /// Wrap `inner` with a cache bounded to `capacity` entries and `default_ttl`.
    #[must_use]
    pub fn new(inner: Arc<P>, capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(default_ttl)
            .build();
        Self {
            inner,
            cache,
            default_ttl,
        }
    }

    /// Access the wrapped provider.
    #[must_use]
    pub fn inner(&self) -> &Arc<P> {
        &self.inner
    }

    fn effective_ttl(&self, options: &QueryOptions) -> Duration {
        match options.cache_time {
            Some(t) => t.min(self.default_ttl),
            None => self.default_ttl,
        }
    }
}

#[async_trait]
impl<P: Provider> Provider for CacheMiddleware<P> {
    fn meta(&self) -> ProviderMeta {
        self.inner.meta()
    }

    async fn fetch(&self, query: &str, options: &QueryOptions) -> Result<Response, ProviderFailure> {
        let key = CacheKey {
            query: query.to_string(),
        };
        let ttl = self.effective_ttl(options);

        if let Some((cached, inserted_at)) = self.cache.get(&key).await
            && inserted_at.elapsed() <= ttl
        {
            #[cfg(feature = "tracing")]
            debug!(provider = self.inner.meta().name, %query, "cache hit");
            return Ok(cached);
        }

        let response = self.inner.fetch(query, options).await?;
        self.cache
            .insert(key, (response.clone(), std::time::Instant::now()))
            .await;
        Ok(response)
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }

    fn calculate_confidence(&self, value: &ResponseValue) -> f64 {
        self.inner.calculate_confidence(value)
    }
}

impl<P: Provider> CacheMiddleware<P> {
    /// Current number of entries resident in the cache, useful for tests
    /// asserting the LRU capacity bound is honored.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}
