//! End-to-end `Oracle::query` scenarios exercised through the public API,
//! one per worked example in the design notes.

use std::sync::Arc;

use oracle::{ConsensusMethod, Oracle, OracleConfig, QueryOptions};
use oracle_mock::{InMemoryLedgerClient, MockNumericProvider, MockTextProvider, FAIL_SENTINEL};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

fn ledger() -> Arc<InMemoryLedgerClient> {
    Arc::new(InMemoryLedgerClient::new())
}

#[tokio::test]
async fn median_of_three_prices() {
    let oracle = Oracle::builder()
        .with_provider(MockNumericProvider::new("a", Decimal::from(42000), 0.9))
        .with_provider(MockNumericProvider::new("b", Decimal::from(42100), 0.9))
        .with_provider(MockNumericProvider::new("c", Decimal::from(42200), 0.9))
        .ledger(ledger())
        .build()
        .unwrap();

    let options = QueryOptions {
        consensus_method: Some(ConsensusMethod::Median),
        ..QueryOptions::default()
    };
    let result = oracle.query("price of BTC", options).await.unwrap();

    assert_eq!(result.value.as_scalar().unwrap(), Decimal::from(42100));
    assert_eq!(result.sources.len(), 3);
    assert!(result.confidence >= 0.5);
}

#[tokio::test]
async fn outlier_rejection() {
    let oracle = Oracle::builder()
        .with_provider(MockNumericProvider::new("a", Decimal::from(42000), 0.9))
        .with_provider(MockNumericProvider::new("b", Decimal::from(42100), 0.9))
        .with_provider(MockNumericProvider::new("c", Decimal::from(100_000), 0.9))
        .config(OracleConfig {
            outlier_threshold: 0.3,
            ..OracleConfig::default()
        })
        .ledger(ledger())
        .build()
        .unwrap();

    let options = QueryOptions {
        consensus_method: Some(ConsensusMethod::Median),
        ..QueryOptions::default()
    };
    let result = oracle.query("price of BTC", options).await.unwrap();

    assert_eq!(result.value.as_scalar().unwrap(), Decimal::from(42050));
    assert_eq!(result.sources.len(), 2);
    assert!(!result.sources.contains(&"c".to_string()));
}

#[tokio::test]
async fn weighted_average_matches_hand_computed_value() {
    let oracle = Oracle::builder()
        .with_provider(MockNumericProvider::new("a", Decimal::from(40000), 0.9))
        .with_provider(MockNumericProvider::new("b", Decimal::from(42000), 0.9))
        .with_provider(MockNumericProvider::new("c", Decimal::from(44000), 0.9))
        .ledger(ledger())
        .build()
        .unwrap();

    let options = QueryOptions {
        consensus_method: Some(ConsensusMethod::WeightedAverage),
        ..QueryOptions::default()
    };
    let result = oracle.query("price of BTC", options).await.unwrap();
    let value = result.value.as_scalar().unwrap().to_f64().unwrap();

    // MockNumericProvider's default weight applies equally to every source here, so
    // the weighted average degenerates to the arithmetic mean of the three inputs.
    assert!((value - 42000.0).abs() < 1.0, "got {value}");
}

#[tokio::test]
async fn majority_vote_falls_back_for_text_responses() {
    let oracle = Oracle::builder()
        .with_provider(MockTextProvider::new("a", "sunny".to_string(), 0.8))
        .with_provider(MockTextProvider::new("b", "sunny".to_string(), 0.8))
        .with_provider(MockTextProvider::new("c", "cloudy".to_string(), 0.8))
        .ledger(ledger())
        .build()
        .unwrap();

    let options = QueryOptions {
        consensus_method: Some(ConsensusMethod::Median),
        ..QueryOptions::default()
    };
    let result = oracle.query("what's the weather in Tokyo", options).await.unwrap();

    assert_eq!(result.method, ConsensusMethod::MajorityVote);
    assert!((result.confidence - 2.0 / 3.0).abs() < 1e-9);
}

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
    ) -> Result<oracle_types::Response, oracle_core::ProviderFailure> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        unreachable!("deadline should have elapsed first")
    }

    fn calculate_confidence(&self, _value: &oracle_types::ResponseValue) -> f64 {
        0.5
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_isolation_across_three_providers() {
    let oracle = Oracle::builder()
        .with_provider(MockNumericProvider::new("fast-a", Decimal::from(1), 0.9))
        .with_provider(MockNumericProvider::new("fast-b", Decimal::from(1), 0.9))
        .with_provider_arc(Arc::new(NeverRespondingProvider))
        .config(OracleConfig {
            min_responses: 1,
            ..OracleConfig::default()
        })
        .ledger(ledger())
        .build()
        .unwrap();

    let options = QueryOptions {
        timeout: Some(std::time::Duration::from_millis(50)),
        ..QueryOptions::default()
    };
    let started = tokio::time::Instant::now();
    let result = oracle.query("asdkjfh qwoeiru", options).await.unwrap();

    assert_eq!(result.sources.len(), 2);
    assert!(!result.sources.contains(&"slow".to_string()));
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
}

#[tokio::test]
async fn a_provider_failure_is_absorbed_not_propagated() {
    let oracle = Oracle::builder()
        .with_provider(MockNumericProvider::new("a", Decimal::from(100), 0.9))
        .with_provider(MockNumericProvider::new("b", Decimal::from(102), 0.9))
        .config(OracleConfig {
            min_responses: 1,
            ..OracleConfig::default()
        })
        .ledger(ledger())
        .build()
        .unwrap();

    let options = QueryOptions {
        sources: Some(vec!["a".to_string(), "b".to_string()]),
        ..QueryOptions::default()
    };
    let query = format!("price of BTC {FAIL_SENTINEL}");
    // Every registered provider observes the same sentinel in the shared
    // query text, so both fail; with minResponses relaxed to 1 this should
    // still surface as an ordinary InsufficientResponses error rather than a
    // panic or a propagated provider-level failure.
    let err = oracle.query(&query, options).await.unwrap_err();
    assert!(matches!(err, oracle::OracleError::InsufficientResponses { got: 0, .. }));
}
