//! The concurrent fetch engine (C6): dispatches one fetch per eligible
//! provider under an independent deadline, waits for every one to settle,
//! and returns only the successes.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use oracle_types::{QueryOptions, Response};
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::registry::ProviderRecord;

/// Fan `query` out to every record in `eligible`, concurrently, each under
/// its own `timeout` deadline. Does not return early on the first-k
/// successes — every dispatched fetch is awaited to completion (success,
/// failure, or timeout) before this function returns. Every settled fetch
/// updates its provider's metrics exactly once, regardless of outcome.
pub async fn fanout(
    eligible: &[Arc<ProviderRecord>],
    query: &str,
    options: &QueryOptions,
    timeout: Duration,
) -> Vec<Response> {
    let mut futs: FuturesUnordered<_> = eligible
        .iter()
        .map(|record| {
            let record = Arc::clone(record);
            let query = query.to_string();
            let options = options.clone();
            async move {
                let started = tokio::time::Instant::now();
                let outcome = tokio::time::timeout(timeout, record.provider().fetch(&query, &options)).await;
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

                record.metrics().record(matches!(outcome, Ok(Ok(_))), elapsed_ms);

                #[cfg(feature = "tracing")]
                match &outcome {
                    Ok(Ok(_)) => debug!(provider = record.name(), elapsed_ms, "provider fetch succeeded"),
                    Ok(Err(failure)) => {
                        warn!(provider = record.name(), ?failure, "provider fetch failed");
                    }
                    Err(_) => warn!(
                        provider = record.name(),
                        timeout_ms = timeout.as_millis() as u64,
                        "provider fetch dropped at deadline"
                    ),
                }

                outcome.ok().and_then(Result::ok)
            }
        })
        .collect();

    let mut responses = Vec::with_capacity(eligible.len());
    while let Some(settled) = futs.next().await {
        if let Some(response) = settled {
            responses.push(response);
        }
    }
    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use oracle_mock::{MockNumericProvider, FAIL_SENTINEL};
    use rust_decimal::Decimal;
    use std::time::Instant;

    fn registry_with(providers: Vec<Arc<dyn oracle_core::Provider>>) -> Registry {
        let registry = Registry::new();
        for p in providers {
            registry.register(p);
        }
        registry
    }

    #[tokio::test]
    async fn collects_every_success_and_drops_failures() {
        let registry = registry_with(vec![
            Arc::new(MockNumericProvider::new("a", Decimal::from(1), 0.9)),
            Arc::new(MockNumericProvider::new("b", Decimal::from(2), 0.9)),
        ]);
        let eligible = registry.all();
        let responses = fanout(&eligible, "price", &QueryOptions::default(), Duration::from_secs(1)).await;
        assert_eq!(responses.len(), 2);
    }

    #[tokio::test]
    async fn a_failing_provider_is_dropped_not_propagated() {
        let registry = registry_with(vec![
            Arc::new(MockNumericProvider::new("a", Decimal::from(1), 0.9)),
            Arc::new(MockNumericProvider::new("b", Decimal::from(2), 0.9)),
        ]);
        let eligible = registry.all();
        let query = format!("price {FAIL_SENTINEL}");
        let responses = fanout(&eligible, &query, &QueryOptions::default(), Duration::from_secs(1)).await;
        assert!(responses.is_empty());
        let snap_a = registry.get("a").unwrap().metrics().snapshot();
        assert_eq!(snap_a.failures, 1);
    }

    /// A provider that never returns within any reasonable test deadline,
    /// used (alongside a normal mock provider) to prove the fanout engine
    /// doesn't wait on a slow provider's latency before returning.
    struct NeverRespondingProvider;

    #[async_trait::async_trait]
    impl oracle_core::Provider for NeverRespondingProvider {
        fn meta(&self) -> oracle_core::ProviderMeta {
            oracle_core::ProviderMeta {
                name: "slow",
                weight: 0.5,
                reliability: 0.5,
                latency_ms: 0,
            }
        }

        async fn fetch(
            &self,
            _query: &str,
            _options: &QueryOptions,
        ) -> Result<Response, oracle_core::ProviderFailure> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("deadline should have elapsed first")
        }

        fn calculate_confidence(&self, _value: &oracle_types::ResponseValue) -> f64 {
            0.5
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_timed_out_provider_does_not_delay_the_others() {
        let registry = registry_with(vec![
            Arc::new(NeverRespondingProvider),
            Arc::new(MockNumericProvider::new("fast", Decimal::from(2), 0.9)),
        ]);
        let eligible = registry.all();

        let started = Instant::now();
        let responses = fanout(&eligible, "price", &QueryOptions::default(), Duration::from_millis(50)).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].source, "fast");
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
