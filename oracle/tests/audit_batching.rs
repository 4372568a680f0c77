//! Audit-logger batch-flush timing, exercised through the public API.
//!
//! Scenario: `batchSize = 5`, three queries submitted, then a fourth after
//! the 5s batch window has elapsed. Expect one flush of the first three at
//! the 5s mark, driven by the batch deadline rather than the size trigger.

use std::sync::Arc;
use std::time::Duration;

use oracle::{Oracle, OracleConfig};
use oracle_mock::{InMemoryLedgerClient, MockNumericProvider};
use oracle_types::QueryOptions;
use rust_decimal::Decimal;

#[tokio::test(start_paused = true)]
async fn a_partial_batch_flushes_on_its_time_window_not_just_its_size() {
    let ledger = Arc::new(InMemoryLedgerClient::new());
    let oracle = Oracle::builder()
        .with_provider(MockNumericProvider::new("a", Decimal::from(1), 0.9))
        .with_provider(MockNumericProvider::new("b", Decimal::from(1), 0.9))
        .config(OracleConfig {
            audit_batch_size: 5,
            audit_batch_window: Duration::from_secs(5),
            min_responses: 1,
            ..OracleConfig::default()
        })
        .ledger(Arc::clone(&ledger) as Arc<dyn oracle_core::LedgerClient>)
        .build()
        .unwrap();

    for _ in 0..3 {
        oracle.query("asdkjfh qwoeiru", QueryOptions::default()).await.unwrap();
        tokio::task::yield_now().await;
    }
    assert_eq!(ledger.len(), 0, "batch of 3 under batchSize=5 should not flush yet");

    tokio::time::sleep(Duration::from_millis(5100)).await;
    tokio::task::yield_now().await;
    assert_eq!(ledger.len(), 3, "batch window should flush the partial batch");

    oracle.query("asdkjfh qwoeiru", QueryOptions::default()).await.unwrap();
    tokio::task::yield_now().await;
    assert_eq!(ledger.len(), 3, "the new query starts a fresh batch, not yet flushed");
}

#[tokio::test]
async fn a_full_batch_flushes_immediately_on_reaching_its_size() {
    let ledger = Arc::new(InMemoryLedgerClient::new());
    let oracle = Oracle::builder()
        .with_provider(MockNumericProvider::new("a", Decimal::from(1), 0.9))
        .config(OracleConfig {
            audit_batch_size: 3,
            min_responses: 1,
            ..OracleConfig::default()
        })
        .ledger(Arc::clone(&ledger) as Arc<dyn oracle_core::LedgerClient>)
        .build()
        .unwrap();

    for _ in 0..3 {
        oracle.query("asdkjfh qwoeiru", QueryOptions::default()).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ledger.len(), 3);
}
