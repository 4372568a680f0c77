//! A deterministic, network-free numeric provider for tests.

use async_trait::async_trait;
use oracle_core::{FailureKind, Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Query substring that makes [`MockNumericProvider`] and [`MockTextProvider`]
/// return an upstream failure, mirroring the `FAIL` sentinel used by the
/// teacher's mock connector.
pub const FAIL_SENTINEL: &str = "FAIL";
/// Query substring that makes the mock provider sleep past any reasonable
/// test deadline, so callers can exercise timeout handling deterministically.
pub const TIMEOUT_SENTINEL: &str = "TIMEOUT";
/// Query substring that makes the mock provider report `RateLimited`.
pub const RATE_LIMIT_SENTINEL: &str = "RATE_LIMIT";

/// A fixed-value numeric provider, useful for exercising the consensus engine
/// with exact, known inputs.
///
/// `value` is returned verbatim on every call unless the query contains one
/// of the sentinel substrings above, in which case the corresponding failure
/// (or, for `TIMEOUT`, an oversized sleep) is triggered instead.
pub struct MockNumericProvider {
    name: &'static str,
    weight: f64,
    reliability: f64,
    value: Decimal,
    confidence: f64,
    calls: AtomicU64,
}

impl MockNumericProvider {
    /// Build a provider that always answers `value` with `confidence`.
    #[must_use]
    pub fn new(name: &'static str, value: Decimal, confidence: f64) -> Self {
        Self {
            name,
            weight: 0.5,
            reliability: 1.0,
            value,
            confidence,
            calls: AtomicU64::new(0),
        }
    }

    /// Override the provider's registry weight (default 0.5).
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Override the provider's nominal reliability metadata (default 1.0).
    #[must_use]
    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability;
        self
    }

    /// Number of times `fetch` has been invoked, for assertions about
    /// fanout/cache behavior (e.g. that a cache hit does not call through).
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockNumericProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: self.name,
            weight: self.weight,
            reliability: self.reliability,
            latency_ms: 5,
        }
    }

    async fn fetch(&self, query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if query.contains(FAIL_SENTINEL) {
            return Err(ProviderFailure::new(
                FailureKind::Upstream,
                format!("{} forced failure", self.name),
            ));
        }
        if query.contains(RATE_LIMIT_SENTINEL) {
            return Err(ProviderFailure::new(
                FailureKind::RateLimited,
                format!("{} rate limited", self.name),
            ));
        }
        if query.contains(TIMEOUT_SENTINEL) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        Ok(Response {
            value: ResponseValue::Scalar(self.value),
            confidence: self.confidence,
            source: self.name.to_string(),
            timestamp: chrono::Utc::now(),
            latency_ms: 5,
            metadata: Default::default(),
        })
    }

    fn calculate_confidence(&self, _value: &ResponseValue) -> f64 {
        self.confidence
    }
}
