//! `PriceFeed` provider backed by CoinGecko's public simple-price endpoint.

use async_trait::async_trait;
use oracle_core::{Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::http::{build_client, malformed, map_reqwest_err};
use crate::query_parse::parse_pair;

const BASE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

fn coin_id(symbol: &str) -> &str {
    match symbol {
        "btc" => "bitcoin",
        "eth" => "ethereum",
        "sol" => "solana",
        "usdt" => "tether",
        "usdc" => "usd-coin",
        "bnb" => "binancecoin",
        "xrp" => "ripple",
        "ada" => "cardano",
        "doge" => "dogecoin",
        other => other,
    }
}

/// Queries CoinGecko's `/simple/price` endpoint for a base/quote pair
/// parsed out of the query text (e.g. `"BTC/USD"`, `"price of bitcoin"`).
pub struct CoinGeckoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinGeckoProvider {
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
impl Provider for CoinGeckoProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: "coingecko",
            weight: 0.6,
            reliability: 0.95,
            latency_ms: 300,
        }
    }

    async fn fetch(&self, query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
        let (base, quote) = parse_pair(query, "usd");
        let id = coin_id(&base);

        let started = std::time::Instant::now();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("ids", id), ("vs_currencies", quote.as_str())])
            .send()
            .await
            .map_err(|e| map_reqwest_err("coingecko", &e))?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| map_reqwest_err("coingecko", &e))?;

        let price = body
            .get(id)
            .and_then(|v| v.get(&quote))
            .and_then(Value::as_f64)
            .ok_or_else(|| malformed("coingecko", format!("no price for {id}/{quote}")))?;

        let value = Decimal::from_f64_retain(price)
            .ok_or_else(|| malformed("coingecko", "non-finite price"))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let mut metadata = BTreeMap::new();
        metadata.insert("coin_id".to_string(), Value::String(id.to_string()));
        metadata.insert("quote".to_string(), Value::String(quote));

        let confidence = self.calculate_confidence(&ResponseValue::Scalar(value));
        Ok(Response {
            value: ResponseValue::Scalar(value),
            confidence,
            source: "coingecko".to_string(),
            timestamp: chrono::Utc::now(),
            latency_ms,
            metadata,
        })
    }

    fn calculate_confidence(&self, _value: &ResponseValue) -> f64 {
        0.9
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[tokio::test]
    async fn fetches_and_parses_a_simple_price_response() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/")
                .query_param("ids", "bitcoin")
                .query_param("vs_currencies", "usd");
            then.status(200)
                .json_body(serde_json::json!({ "bitcoin": { "usd": 42000.5 } }));
        });

        let provider = CoinGeckoProvider::with_base_url(server.url("/"));
        let response = provider.fetch("BTC/USD", &QueryOptions::default()).await.unwrap();

        mock.assert();
        assert_eq!(
            response.value,
            ResponseValue::Scalar(Decimal::from_f64_retain(42000.5).unwrap())
        );
        assert_eq!(response.source, "coingecko");
    }

    #[tokio::test]
    async fn missing_price_is_reported_as_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/");
            then.status(200).json_body(serde_json::json!({}));
        });

        let provider = CoinGeckoProvider::with_base_url(server.url("/"));
        let err = provider.fetch("BTC/USD", &QueryOptions::default()).await.unwrap_err();
        assert_eq!(err.kind, oracle_core::FailureKind::Malformed);
    }
}
