//! oracle-core
//!
//! Core traits and runtime utilities shared across the oracle workspace.
//!
//! - `provider`: the `Provider` capability contract (C1).
//! - `metrics`: per-provider health counters (C3).
//! - `ledger`: the external append-only ledger contract consulted by the audit logger (C8).
//! - `filter`: the conversational pre-filter contract consulted by the router (C9).
//! - `stream`: graceful-shutdown primitives for the audit logger's background task.
#![warn(missing_docs)]

/// The conversational pre-filter contract.
pub mod filter;
/// The external ledger contract.
pub mod ledger;
/// Per-provider health counters.
pub mod metrics;
/// The `Provider` capability contract.
pub mod provider;
/// Graceful-shutdown primitives for background tasks.
pub mod stream;

pub use filter::{ConversationalFilter, NeverConversational};
pub use ledger::{LedgerClient, LedgerError};
pub use metrics::{MetricsSnapshot, ProviderMetrics};
pub use provider::{FailureKind, Provider, ProviderFailure, ProviderMeta};
pub use stream::TaskHandle;

pub use oracle_types::{
    AuditChunk, AuditRecord, ConsensusMethod, ConsensusResult, OracleConfig, OracleError,
    ProviderTable, QueryOptions, QueryType, Response, ResponseValue,
};
