//! The provider registry (C4): `name -> ProviderRecord` mapping.
//!
//! Insertion and removal are serialized through a single `RwLock`; lookups
//! take a shared read lock, so concurrent `query()` calls never contend with
//! each other over registry reads — only a concurrent register/unregister
//! blocks them, and only briefly.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use oracle_core::{Provider, ProviderMetrics};

/// A registered provider plus the runtime metrics owned by its own tasks.
///
/// The provider handle stored here is expected to already be wrapped in
/// whatever per-provider middleware applies (caching, rate limiting) —
/// the registry itself has no opinion on that, it only owns metrics, which
/// have no middleware-wrappable equivalent since every fetch must be
/// observed regardless of whether it was served from cache.
pub struct ProviderRecord {
    provider: Arc<dyn Provider>,
    metrics: ProviderMetrics,
}

impl ProviderRecord {
    fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            metrics: ProviderMetrics::new(),
        }
    }

    /// The wrapped provider handle.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// This provider's live health/latency counters.
    #[must_use]
    pub fn metrics(&self) -> &ProviderMetrics {
        &self.metrics
    }

    /// The provider's registered name (its registry key).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.provider.meta().name
    }
}

/// Name -> `ProviderRecord` map. No two providers may share a name;
/// registering a name that's already present replaces the prior entry
/// (last-writer-wins), dropping its accumulated metrics along with it.
#[derive(Default)]
pub struct Registry {
    providers: RwLock<HashMap<&'static str, Arc<ProviderRecord>>>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its own `meta().name`. Last-writer-wins on
    /// a name collision.
    pub fn register(&self, provider: Arc<dyn Provider>) {
        let name = provider.meta().name;
        let record = Arc::new(ProviderRecord::new(provider));
        self.providers
            .write()
            .expect("registry lock poisoned")
            .insert(name, record);
    }

    /// Remove and return the record registered under `name`, if any.
    pub fn unregister(&self, name: &str) -> Option<Arc<ProviderRecord>> {
        self.providers
            .write()
            .expect("registry lock poisoned")
            .remove(name)
    }

    /// Look up the record registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ProviderRecord>> {
        self.providers
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// Every registered record, in unspecified order.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<ProviderRecord>> {
        self.providers
            .read()
            .expect("registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Every registered provider name, in unspecified order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.providers
            .read()
            .expect("registry lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.read().expect("registry lock poisoned").len()
    }

    /// `true` if no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Probe every registered provider's health and record the result on
    /// its own metrics. Best-effort: a probe has no effect beyond
    /// `lastHealth` (the fanout engine never consults it).
    pub async fn health_check_all(&self) -> HashMap<String, bool> {
        let records = self.all();
        let mut out = HashMap::with_capacity(records.len());
        for record in records {
            let healthy = record.provider().health_check().await;
            record.metrics().record_health(healthy);
            out.insert(record.name().to_string(), healthy);
        }
        out
    }
}
