//! A deterministic, network-free text/struct provider for tests.

use async_trait::async_trait;
use oracle_core::{FailureKind, Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use std::time::Duration;

use crate::numeric::{FAIL_SENTINEL, RATE_LIMIT_SENTINEL, TIMEOUT_SENTINEL};

/// A fixed-text provider, useful for exercising `MajorityVote` consensus with
/// known agreeing/disagreeing strings.
pub struct MockTextProvider {
    name: &'static str,
    weight: f64,
    text: String,
    confidence: f64,
}

impl MockTextProvider {
    /// Build a provider that always answers `text` with `confidence`.
    #[must_use]
    pub fn new(name: &'static str, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            name,
            weight: 0.5,
            text: text.into(),
            confidence,
        }
    }

    /// Override the provider's registry weight (default 0.5).
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

#[async_trait]
impl Provider for MockTextProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: self.name,
            weight: self.weight,
            reliability: 1.0,
            latency_ms: 5,
        }
    }

    async fn fetch(&self, query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
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
            value: ResponseValue::Text(self.text.clone()),
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
