//! `oracle` orchestrates requests across multiple heterogeneous data
//! providers (price feeds, FX rates, weather, space data, encyclopedic
//! knowledge, news search) and reconciles their answers into one typed
//! result.
//!
//! Overview
//! - Routes a natural-language query to an eligible provider set via a
//!   lightweight heuristic classifier, or an explicit `sources` override.
//! - Fans the query out concurrently, each provider bounded by its own
//!   timeout, and waits for every dispatched fetch to settle before
//!   proceeding — a slow provider never delays the others' contributions.
//! - Reconciles the surviving responses with one of four consensus
//!   methods (`Median`, `WeightedAverage`, `MajorityVote`,
//!   `ConfidenceWeighted`), after rejecting statistical outliers.
//! - Appends every resolved query to an append-only external ledger,
//!   batched and size-bounded, without blocking the caller on the ledger
//!   round trip.
//!
//! Key behaviors and trade-offs
//! - Classification: a pure, ordered keyword heuristic. Unrecognized input
//!   falls back to `Custom`, which fans out to every registered provider
//!   rather than none — under-classifying is cheaper to recover from than
//!   silently narrowing an answer.
//! - Consensus: `Median` and `WeightedAverage`/`ConfidenceWeighted` act
//!   only on numeric responses and fall back to `MajorityVote` (which
//!   handles both numeric and non-numeric values) when none are numeric.
//! - Audit batching: `batchSize == 1` submits synchronously and returns a
//!   real ledger transaction id; anything larger batches for lower ledger
//!   traffic at the cost of a synthetic handle until the batch flushes.
//!
//! Examples
//! - End-to-end fanout/consensus: see `./tests/`.
#![warn(missing_docs)]

mod audit;
mod classifier;
mod consensus;
mod fanout;
#[allow(clippy::module_inception)]
mod oracle;
mod registry;

pub use audit::{AuditLogger, SubmitOutcome};
pub use oracle::{Oracle, OracleBuilder};
pub use registry::{ProviderRecord, Registry};

pub use oracle_core::{
    ConversationalFilter, FailureKind, LedgerClient, LedgerError, MetricsSnapshot,
    NeverConversational, Provider, ProviderFailure, ProviderMeta, ProviderMetrics, TaskHandle,
};
pub use oracle_middleware::{CacheMiddleware, RateLimiter};
pub use oracle_types::{
    AuditChunk, AuditRecord, ConsensusMethod, ConsensusResult, OracleConfig, OracleError,
    ProviderTable, QueryOptions, QueryType, Response, ResponseValue,
};

/// The query-type classifier, exposed for callers that want to inspect
/// classification without constructing a full [`Oracle`].
pub use classifier::classify;
