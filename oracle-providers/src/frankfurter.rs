//! `ExchangeRate` provider backed by the free Frankfurter FX API.

use async_trait::async_trait;
use oracle_core::{Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::http::{build_client, malformed, map_reqwest_err};
use crate::query_parse::parse_pair;

const BASE_URL: &str = "https://api.frankfurter.app/latest";

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    rates: BTreeMap<String, f64>,
}

/// Queries Frankfurter's `/latest` endpoint for a `from`/`to` currency pair
/// parsed out of the query text (e.g. `"EUR/USD"`, `"EUR to USD"`).
pub struct FrankfurterProvider {
    client: reqwest::Client,
    base_url: String,
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FrankfurterProvider {
    /// Build a provider with its own HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    /// Build a provider against a caller-supplied endpoint (e.g. a mock
    /// server for tests).
    #[must_use]
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: build_client(),
            base_url,
        }
    }
}

#[async_trait]
impl Provider for FrankfurterProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: "frankfurter",
            weight: 0.7,
            reliability: 0.96,
            latency_ms: 250,
        }
    }

    async fn fetch(&self, query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
        let (base, quote) = parse_pair(query, "usd");
        let base_upper = base.to_uppercase();
        let quote_upper = quote.to_uppercase();

        let started = std::time::Instant::now();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("from", base_upper.as_str()), ("to", quote_upper.as_str())])
            .send()
            .await
            .map_err(|e| map_reqwest_err("frankfurter", &e))?;

        let parsed: FrankfurterResponse = resp
            .json()
            .await
            .map_err(|e| map_reqwest_err("frankfurter", &e))?;

        let rate = parsed
            .rates
            .get(&quote_upper)
            .copied()
            .ok_or_else(|| malformed("frankfurter", format!("no rate for {quote_upper}")))?;
        let value = Decimal::try_from(rate)
            .map_err(|e| malformed("frankfurter", format!("non-finite rate: {e}")))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let mut metadata = BTreeMap::new();
        metadata.insert("from".to_string(), serde_json::Value::String(base_upper));
        metadata.insert("to".to_string(), serde_json::Value::String(quote_upper));

        let confidence = self.calculate_confidence(&ResponseValue::Scalar(value));
        Ok(Response {
            value: ResponseValue::Scalar(value),
            confidence,
            source: "frankfurter".to_string(),
            timestamp: chrono::Utc::now(),
            latency_ms,
            metadata,
        })
    }

    fn calculate_confidence(&self, _value: &ResponseValue) -> f64 {
        0.92
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[tokio::test]
    async fn fetches_and_parses_a_rate() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/")
                .query_param("from", "EUR")
                .query_param("to", "USD");
            then.status(200)
                .json_body(serde_json::json!({ "rates": { "USD": 1.0823 } }));
        });

        let provider = FrankfurterProvider::with_base_url(server.url("/"));
        let response = provider.fetch("EUR/USD", &QueryOptions::default()).await.unwrap();

        mock.assert();
        assert_eq!(
            response.value,
            ResponseValue::Scalar(Decimal::try_from(1.0823).unwrap())
        );
    }
}
