//! The external-ledger contract consulted by the audit logger (C8).
//!
//! The audit record's wire shape (`hcsTimestamp`) and its 1024-byte
//! single-message budget both point at Hedera Consensus Service as the
//! ledger this was modeled on, but the core only depends on this thin
//! trait — the concrete backend (Hedera, or an in-memory stand-in for
//! tests) is a pluggable external collaborator, never compiled into the core.

use async_trait::async_trait;
use thiserror::Error;

/// Failure submitting a batch of bytes to the external ledger.
#[derive(Debug, Clone, Error)]
#[error("ledger submission failed: {0}")]
pub struct LedgerError(pub String);

impl LedgerError {
    /// Construct a new ledger error from a message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A pluggable adapter to an append-only external ledger topic.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit `payload` to `topic`, returning the ledger's transaction id on success.
    async fn submit(&self, topic: &str, payload: Vec<u8>) -> Result<String, LedgerError>;
}
