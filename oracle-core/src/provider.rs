//! The `Provider` capability contract (C1).

use async_trait::async_trait;
use oracle_types::{OracleError, QueryOptions, Response};

/// Static, registration-time facts about a provider. `weight` and
/// `reliability` are priors used by the consensus engine and by
/// `WeightedAverage` when a response's provider is absent from the registry
/// (in which case a default weight of `0.5` is used instead).
#[derive(Debug, Clone, Copy)]
pub struct ProviderMeta {
    /// Unique provider name; doubles as the registry key.
    pub name: &'static str,
    /// Static weight in `(0, 1]` used by `WeightedAverage`.
    pub weight: f64,
    /// Static reliability prior in `(0, 1]`.
    pub reliability: f64,
    /// Informational latency estimate, in milliseconds.
    pub latency_ms: u64,
}

/// The reason a provider's `fetch` did not produce a `Response`.
///
/// Observable to the fanout engine for metrics purposes only — never
/// surfaced verbatim to the caller of `query()`, per the provider contract's
/// failure semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The provider did not respond within its deadline.
    Timeout,
    /// The provider does not support this query.
    Unsupported,
    /// The upstream data source returned an error.
    Upstream,
    /// The provider is self-throttling under rate pressure.
    RateLimited,
    /// The upstream response could not be parsed into a `Response`.
    Malformed,
}

/// A provider-level failure: a `FailureKind` plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// The failure category.
    pub kind: FailureKind,
    /// A human-readable description, useful for logs but never shown to callers verbatim.
    pub message: String,
}

impl ProviderFailure {
    /// Construct a new failure.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Uniform capability every data provider implements.
///
/// Implementors are concrete types satisfying this single interface — the
/// provider contract is a capability, not an inheritance hierarchy (price,
/// weather, and knowledge providers are peers, never subtypes of one
/// another).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Static registration facts: name, weight, reliability, latency estimate.
    fn meta(&self) -> ProviderMeta;

    /// Given a query string and the effective per-request options, produce a
    /// `Response` or fail with a `ProviderFailure`. Must return within
    /// `options.timeout`; the caller is responsible for abandoning the
    /// future past that deadline — this method itself does not self-enforce it.
    async fn fetch(&self, query: &str, options: &QueryOptions) -> Result<Response, ProviderFailure>;

    /// Best-effort health probe. Has no side effect on metrics beyond the
    /// caller's own bookkeeping of `lastHealth`.
    async fn health_check(&self) -> bool {
        true
    }

    /// Provider-specific quality score for a successful fetch's value,
    /// called once before the `Response` carrying it is emitted.
    fn calculate_confidence(&self, value: &oracle_types::ResponseValue) -> f64;
}

/// Convert a `ProviderFailure` into the crate-wide `OracleError` used when a
/// caller-facing path (rather than the fanout engine) needs to report it —
/// e.g. a provider invoked directly outside the router.
impl From<ProviderFailure> for OracleError {
    fn from(f: ProviderFailure) -> Self {
        OracleError::Provider {
            provider: String::new(),
            msg: f.message,
        }
    }
}
