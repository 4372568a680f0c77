//! Configuration recognized by the oracle pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consensus::ConsensusMethod;

/// Global configuration for the `Oracle` router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Consensus method used when the caller doesn't specify one.
    pub default_method: ConsensusMethod,
    /// Minimum number of successful responses required to reach consensus. Must be `>= 1`.
    pub min_responses: usize,
    /// Default per-provider fetch deadline.
    pub max_response_time: Duration,
    /// Multiplier on `stdDev` inside the 3-sigma outlier rule.
    pub outlier_threshold: f64,
    /// Default provider-cache entry lifetime.
    pub cache_ttl: Duration,
    /// Per-provider cache capacity (LRU-evicted beyond this).
    pub cache_capacity: u64,
    /// Number of audit records batched before a flush, clamped to `[1, 50]`.
    pub audit_batch_size: usize,
    /// Maximum time an audit batch may sit before being flushed regardless of size.
    pub audit_batch_window: Duration,
}

impl OracleConfig {
    /// Apply the same clamping rules the router enforces at the public API
    /// boundary (`minResponses >= 1`, `auditBatchSize` in `[1, 50]`).
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.min_responses = self.min_responses.max(1);
        self.audit_batch_size = self.audit_batch_size.clamp(1, 50);
        self
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            default_method: ConsensusMethod::Median,
            min_responses: 2,
            max_response_time: Duration::from_secs(10),
            outlier_threshold: 0.3,
            cache_ttl: Duration::from_secs(60),
            cache_capacity: 100,
            audit_batch_size: 10,
            audit_batch_window: Duration::from_secs(5),
        }
        .clamped()
    }
}

/// Per-request overrides accepted by `Oracle::query`.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Explicit provider names to fetch from, overriding the classifier's
    /// eligible set (intersected with the registered set).
    pub sources: Option<Vec<String>>,
    /// Consensus method override for this call only.
    pub consensus_method: Option<ConsensusMethod>,
    /// Per-provider fetch deadline override for this call only.
    pub timeout: Option<Duration>,
    /// Maximum age of a cached response this call will accept.
    pub cache_time: Option<Duration>,
}
