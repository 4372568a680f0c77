use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the oracle workspace.
///
/// Mirrors the taxonomy consulted by the router: capability mismatches,
/// consensus-level failures, and an aggregate for multi-provider attempts.
/// Provider-level failures never reach a caller directly — they are
/// absorbed into `AllProvidersFailed`/`InsufficientResponses` by the fanout
/// and consensus engines.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq)]
#[non_exhaustive]
pub enum OracleError {
    /// The requested capability is not implemented by any eligible provider.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Invalid input argument (empty query, unknown explicit source, etc.).
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A single provider call failed or timed out.
    #[error("{provider} failed: {msg}")]
    Provider {
        /// Provider name that failed.
        provider: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A resource could not be found.
    #[error("not found: {0}")]
    NotFound(String),

    /// All eligible providers failed or timed out; contains the individual failures.
    #[error("all providers failed: {0:?}")]
    AllProvidersFailed(Vec<OracleError>),

    /// The eligible provider set was smaller than `minResponses` before any fetch was attempted.
    #[error("insufficient providers: eligible={eligible} required={required}")]
    InsufficientProviders {
        /// Number of eligible (registered) providers found for this query.
        eligible: usize,
        /// Configured `minResponses`.
        required: usize,
    },

    /// Fanout returned, but fewer than `minResponses` providers succeeded.
    #[error("insufficient responses: got={got} required={required}")]
    InsufficientResponses {
        /// Number of successful responses collected.
        got: usize,
        /// Configured `minResponses`.
        required: usize,
        /// The responses that were collected, for diagnostics.
        raw_responses: Vec<crate::response::Response>,
    },

    /// Caller requested a consensus method the engine does not implement.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The overall request exceeded its configured deadline.
    #[error("timeout")]
    Timeout,

    /// The caller cancelled the in-flight query before it completed.
    #[error("cancelled")]
    Cancelled,

    /// Submission to the external ledger failed. Never surfaced through
    /// `query()`; present so the audit logger's own error events are typed
    /// consistently with the rest of the taxonomy.
    #[error("ledger submission failed: {0}")]
    LedgerSubmissionFailed(String),
}

impl OracleError {
    /// Helper: build an `Unsupported` error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Helper: build a `Provider` error with the provider name and message.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Returns true if this error should be surfaced to users as actionable,
    /// i.e. it represents something other than benign unsupported/not-found.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        match self {
            Self::Unsupported(_) | Self::NotFound(_) => false,
            Self::AllProvidersFailed(inner) => inner.iter().any(Self::is_actionable),
            _ => true,
        }
    }

    /// Flatten nested `AllProvidersFailed` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllProvidersFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }

    /// The wire token for this error's `kind`, per the public failure shape.
    #[must_use]
    pub fn wire_kind(&self) -> &'static str {
        match self {
            Self::InsufficientProviders { .. } => "insufficient_providers",
            Self::InsufficientResponses { .. } => "insufficient_responses",
            Self::UnsupportedMethod(_) => "unsupported_method",
            Self::Timeout => "timeout",
            _ => "provider_error",
        }
    }
}
