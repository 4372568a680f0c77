use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::consensus::ConsensusMethod;

/// A provider's reply value. Modeled as an explicit variant per the
/// polymorphic-response design note — never as an untyped value — so the
/// consensus engine can branch on the variant instead of guessing at
/// runtime. Serialized untagged (a bare scalar, string, or object on the
/// wire, per §6's `<scalar|object>` value shape) rather than as an
/// internally-tagged enum: `serde_json` cannot represent an internally
/// tagged newtype variant whose content is itself a scalar or string, and
/// the wire format promises a bare value regardless. Variant order matters
/// for deserialization — `Scalar` is tried first so a numeric or
/// decimal-shaped string round-trips as a number, `Struct` second so a JSON
/// object is never mistaken for text, and `Text` last as the catch-all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    /// A single numeric value (e.g. a price).
    Scalar(Decimal),
    /// A structured record (e.g. a weather observation).
    Struct(BTreeMap<String, serde_json::Value>),
    /// Free-form text (e.g. an encyclopedia summary or a search hit title).
    Text(String),
}

impl ResponseValue {
    /// `true` for `Scalar`, the only variant the numeric consensus methods act on.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// The scalar value, if this is a `Scalar`.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<Decimal> {
        match self {
            Self::Scalar(d) => Some(*d),
            _ => None,
        }
    }

    /// A canonical string serialization used by `MajorityVote` to group
    /// semantically-equal values regardless of representation.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Scalar(d) => format!("scalar:{}", d.normalize()),
            Self::Text(s) => format!("text:{s}"),
            Self::Struct(map) => {
                // BTreeMap iterates in key order, so this is stable regardless
                // of insertion order — required for MajorityVote's grouping to
                // be deterministic across equivalent responses.
                let mut out = String::from("struct:{");
                for (k, v) in map {
                    out.push_str(k);
                    out.push('=');
                    out.push_str(&v.to_string());
                    out.push(';');
                }
                out.push('}');
                out
            }
        }
    }
}

/// One provider's successful reply to a `fetch`. A `Response` is emitted only
/// on success; failures are represented separately and never constructed as
/// a `Response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The provider's answer.
    pub value: ResponseValue,
    /// Provider-assigned quality score in `[0, 1]`.
    pub confidence: f64,
    /// Unique provider name that produced this response.
    pub source: String,
    /// Instant of reception.
    pub timestamp: DateTime<Utc>,
    /// Observed elapsed time for the fetch, in milliseconds.
    pub latency_ms: u64,
    /// Opaque metadata (query echo, options echo, provider-specific extras).
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// The reconciled output of the consensus engine (C7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// The reconciled value.
    pub value: ResponseValue,
    /// Reconciled confidence in `[0, 1]`.
    pub confidence: f64,
    /// The method used to produce this result.
    pub method: ConsensusMethod,
    /// Provider names that survived outlier removal and contributed to `value`.
    pub sources: Vec<String>,
    /// All responses considered, before outlier removal.
    pub raw_responses: Vec<Response>,
    /// Instant this result was assembled.
    pub timestamp: DateTime<Utc>,
}

impl ConsensusResult {
    /// The sentinel result returned when the conversational pre-filter
    /// short-circuits the router before any fanout or audit submission.
    #[must_use]
    pub fn conversational() -> Self {
        Self {
            value: ResponseValue::Text(String::new()),
            confidence: 0.95,
            method: ConsensusMethod::MajorityVote,
            sources: vec!["conversational".to_string()],
            raw_responses: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

/// The append-only ledger record for one `(query, ConsensusResult)` pair.
///
/// Serialized camelCase, per the audit-record wire shape in §6
/// (`queryId`/`hcsTimestamp`/`transactionId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Globally-unique id assigned by the router at the start of `query()`.
    pub query_id: String,
    /// The original query text.
    pub query: String,
    /// The consensus result being recorded (pruned fields are dropped by the
    /// audit logger, not by this type, so the full result is kept in memory
    /// until it is serialized onto the wire).
    pub result: ConsensusResult,
    /// Timestamp assigned by the external ledger (HCS consensus timestamp),
    /// populated only after the ledger has accepted the message.
    pub hcs_timestamp: Option<DateTime<Utc>>,
    /// The ledger transaction id, or empty if this record is still batched
    /// and has not yet been submitted.
    pub transaction_id: String,
}

/// One fragment of an `AuditRecord` that exceeded the single-message size
/// budget and was split rather than field-pruned.
///
/// Serialized camelCase, per §6's chunk wire shape
/// (`chunkIndex`/`totalChunks`/`queryId`), aside from `kind`, which keeps
/// its own explicit `"type"` rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChunk {
    /// Literal `"chunk"`, distinguishing this shape from a whole `AuditRecord` on the wire.
    #[serde(rename = "type")]
    pub kind: String,
    /// Zero-based index of this chunk.
    pub chunk_index: u32,
    /// Total number of chunks for this record.
    pub total_chunks: u32,
    /// The query id this chunk belongs to.
    pub query_id: String,
    /// The serialized entries carried by this chunk.
    pub entries: Vec<serde_json::Value>,
}
