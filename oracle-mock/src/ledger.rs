//! An in-process `LedgerClient` for tests, standing in for Hedera Consensus
//! Service submission without any network access.

use async_trait::async_trait;
use oracle_core::ledger::{LedgerClient, LedgerError};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// One submission recorded by [`InMemoryLedgerClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    /// Topic the payload was submitted to.
    pub topic: String,
    /// Raw bytes submitted.
    pub payload: Vec<u8>,
    /// Transaction id returned to the caller.
    pub transaction_id: String,
}

/// Records every submission in order and hands back a deterministic,
/// incrementing transaction id. Can be told to fail the next N submissions,
/// for exercising the audit logger's bounded-retry-then-drop path.
#[derive(Default)]
pub struct InMemoryLedgerClient {
    submissions: Mutex<Vec<RecordedSubmission>>,
    next_id: AtomicU64,
    forced_failures: AtomicU64,
}

impl InMemoryLedgerClient {
    /// An empty ledger with no forced failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `submit` fail before any bookkeeping
    /// takes place.
    pub fn fail_next(&self, count: u64) {
        self.forced_failures.store(count, Ordering::SeqCst);
    }

    /// All submissions accepted so far, in submission order.
    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().expect("mutex poisoned").clone()
    }

    /// Number of submissions accepted so far.
    pub fn len(&self) -> usize {
        self.submissions.lock().expect("mutex poisoned").len()
    }

    /// Whether no submissions have been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedgerClient {
    async fn submit(&self, topic: &str, payload: Vec<u8>) -> Result<String, LedgerError> {
        loop {
            let remaining = self.forced_failures.load(Ordering::SeqCst);
            if remaining == 0 {
                break;
            }
            if self
                .forced_failures
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Err(LedgerError::new("forced test failure"));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let transaction_id = format!("0.0.mock@{id}");
        self.submissions
            .lock()
            .expect("mutex poisoned")
            .push(RecordedSubmission {
                topic: topic.to_string(),
                payload,
                transaction_id: transaction_id.clone(),
            });
        Ok(transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_submissions_with_incrementing_ids() {
        let ledger = InMemoryLedgerClient::new();
        let first = ledger.submit("oracle-audit", b"a".to_vec()).await.unwrap();
        let second = ledger.submit("oracle-audit", b"b".to_vec()).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn forced_failures_are_consumed_then_succeed() {
        let ledger = InMemoryLedgerClient::new();
        ledger.fail_next(2);
        assert!(ledger.submit("t", vec![]).await.is_err());
        assert!(ledger.submit("t", vec![]).await.is_err());
        assert!(ledger.submit("t", vec![]).await.is_ok());
        assert_eq!(ledger.len(), 1);
    }
}
