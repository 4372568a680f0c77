//! Shared `reqwest` client construction and error mapping.
//!
//! Each concrete provider builds URL + parses response in its own file;
//! this module only centralizes the bits that would otherwise be copied
//! verbatim into every adapter.

use oracle_core::{FailureKind, ProviderFailure};
use std::time::Duration;

/// Build a `reqwest::Client` with a conservative connect/request timeout.
/// Each provider owns one client for its lifetime rather than building a
/// fresh one per call.
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(8))
        .user_agent(concat!("oracle/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("TLS backend initialization failed")
}

/// Map a `reqwest::Error` to the provider failure taxonomy.
pub fn map_reqwest_err(provider: &str, err: &reqwest::Error) -> ProviderFailure {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_decode() {
        FailureKind::Malformed
    } else if err
        .status()
        .is_some_and(|s| s.as_u16() == 429)
    {
        FailureKind::RateLimited
    } else {
        FailureKind::Upstream
    };
    ProviderFailure::new(kind, format!("{provider}: {err}"))
}

/// Build a `Malformed` failure for responses that parse as JSON but don't
/// have the shape a provider expected.
pub fn malformed(provider: &str, detail: impl std::fmt::Display) -> ProviderFailure {
    ProviderFailure::new(FailureKind::Malformed, format!("{provider}: {detail}"))
}
