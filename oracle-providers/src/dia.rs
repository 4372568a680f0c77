//! `PriceFeed` provider backed by DIA Data's public price endpoint.

use async_trait::async_trait;
use oracle_core::{Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::http::{build_client, malformed, map_reqwest_err};
use crate::query_parse::parse_pair;

const BASE_URL: &str = "https://api.diadata.org/v1/assetQuotation/Ethereum";

#[derive(Debug, Deserialize)]
struct DiaQuote {
    #[serde(rename = "Price")]
    price: f64,
    #[serde(rename = "Symbol")]
    symbol: String,
}

fn token_address(symbol: &str) -> &str {
    match symbol {
        "eth" => "0x0000000000000000000000000000000000000000",
        "usdc" => "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
        "usdt" => "0xdAC17F958D2ee523a2206206994597C13D831ec7",
        other => other,
    }
}

/// Queries DIA's asset-quotation endpoint. DIA prices all assets in USD, so
/// this provider only uses the base symbol out of any parsed pair; a
/// non-USD quote in the query is ignored, matching the upstream's scope.
pub struct DiaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl Default for DiaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DiaProvider {
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
impl Provider for DiaProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: "dia",
            weight: 0.5,
            reliability: 0.9,
            latency_ms: 350,
        }
    }

    async fn fetch(&self, query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
        let (base, _quote) = parse_pair(query, "usd");
        let address = token_address(&base);
        let url = format!("{}/{address}", self.base_url);

        let started = std::time::Instant::now();
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_reqwest_err("dia", &e))?;

        let quote: DiaQuote = resp.json().await.map_err(|e| map_reqwest_err("dia", &e))?;
        let value = Decimal::from_f64_retain(quote.price)
            .ok_or_else(|| malformed("dia", "non-finite price"))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "symbol".to_string(),
            serde_json::Value::String(quote.symbol),
        );

        let confidence = self.calculate_confidence(&ResponseValue::Scalar(value));
        Ok(Response {
            value: ResponseValue::Scalar(value),
            confidence,
            source: "dia".to_string(),
            timestamp: chrono::Utc::now(),
            latency_ms,
            metadata,
        })
    }

    fn calculate_confidence(&self, _value: &ResponseValue) -> f64 {
        0.85
    }
}
