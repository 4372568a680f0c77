#![doc = include_str!("../README.md")]
//! oracle-mock
//!
//! Deterministic, network-free `Provider`, `LedgerClient`, and
//! `ConversationalFilter` implementations for unit and integration tests.
#![warn(missing_docs)]

mod filter;
mod ledger;
mod numeric;
mod text;

pub use filter::KeywordConversationalFilter;
pub use ledger::{InMemoryLedgerClient, RecordedSubmission};
pub use numeric::{MockNumericProvider, FAIL_SENTINEL, RATE_LIMIT_SENTINEL, TIMEOUT_SENTINEL};
pub use text::MockTextProvider;
