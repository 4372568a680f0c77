//! `PriceFeed` provider reading a Chainlink aggregator's `latestAnswer` via
//! a single raw `eth_call` JSON-RPC request.
//!
//! No `ethers`/`web3` dependency: the ABI encoding here is the minimum
//! needed to call a zero-argument `view` function and decode an `int256`
//! return value, done by hand the way a thin read-only integration would be
//! written without pulling in a full chain client.

use async_trait::async_trait;
use oracle_core::{FailureKind, Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::http::{build_client, malformed, map_reqwest_err};
use crate::query_parse::parse_pair;

const DEFAULT_RPC_URL: &str = "https://eth.llamarpc.com";

/// `keccak256("latestAnswer()")[0..4]`, the Solidity function selector for
/// `AggregatorInterface.latestAnswer()`.
const LATEST_ANSWER_SELECTOR: &str = "0x50d25bcd";

/// Mainnet Chainlink aggregator addresses, keyed by lowercase `base/quote`
/// pair, and the number of decimals their `latestAnswer` is scaled by.
fn feed(base: &str, quote: &str) -> Option<(&'static str, u32)> {
    match (base, quote) {
        ("eth", "usd") => Some(("0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419", 8)),
        ("btc", "usd") => Some(("0xF4030086522a5bEEa4988F8cA5B36dbC97BeE88c", 8)),
        ("link", "usd") => Some(("0x2c1d072e956AFFC0D435Cb7AC38EF18d24d9127c", 8)),
        _ => None,
    }
}

/// Reads a Chainlink price feed's `latestAnswer` over a public Ethereum
/// JSON-RPC endpoint.
pub struct ChainlinkProvider {
    client: reqwest::Client,
    rpc_url: String,
}

impl Default for ChainlinkProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainlinkProvider {
    /// Build a provider that talks to the default public RPC endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rpc_url(DEFAULT_RPC_URL.to_string())
    }

    /// Build a provider against a caller-supplied RPC endpoint (e.g. a
    /// dedicated node or a local devnet for tests).
    #[must_use]
    pub fn with_rpc_url(rpc_url: String) -> Self {
        Self {
            client: build_client(),
            rpc_url,
        }
    }
}

#[async_trait]
impl Provider for ChainlinkProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: "chainlink",
            weight: 0.8,
            reliability: 0.97,
            latency_ms: 400,
        }
    }

    async fn fetch(&self, query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
        let (base, quote) = parse_pair(query, "usd");
        let (address, decimals) = feed(&base, &quote).ok_or_else(|| {
            ProviderFailure::new(
                FailureKind::Unsupported,
                format!("chainlink: no known feed for {base}/{quote}"),
            )
        })?;

        let started = std::time::Instant::now();
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{ "to": address, "data": LATEST_ANSWER_SELECTOR }, "latest"],
        });

        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_reqwest_err("chainlink", &e))?;

        let parsed: Value = resp
            .json()
            .await
            .map_err(|e| map_reqwest_err("chainlink", &e))?;

        if let Some(err) = parsed.get("error") {
            return Err(ProviderFailure::new(
                FailureKind::Upstream,
                format!("chainlink: rpc error: {err}"),
            ));
        }

        let hex_result = parsed
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("chainlink", "missing eth_call result"))?;

        let raw = decode_int256(hex_result)
            .ok_or_else(|| malformed("chainlink", format!("unparsable result: {hex_result}")))?;
        let scale = Decimal::from(10u64.pow(decimals));
        let value = Decimal::from(raw) / scale;
        let latency_ms = started.elapsed().as_millis() as u64;

        let mut metadata = BTreeMap::new();
        metadata.insert("feed_address".to_string(), Value::String(address.to_string()));
        metadata.insert("decimals".to_string(), Value::from(decimals));

        let confidence = self.calculate_confidence(&ResponseValue::Scalar(value));
        Ok(Response {
            value: ResponseValue::Scalar(value),
            confidence,
            source: "chainlink".to_string(),
            timestamp: chrono::Utc::now(),
            latency_ms,
            metadata,
        })
    }

    fn calculate_confidence(&self, _value: &ResponseValue) -> f64 {
        0.95
    }
}

/// Decode a `0x`-prefixed, 32-byte, big-endian two's-complement `int256`
/// hex string as returned by `eth_call`.
fn decode_int256(hex: &str) -> Option<i128> {
    let hex = hex.strip_prefix("0x")?;
    let bytes = hex_to_bytes(hex)?;
    if bytes.len() != 32 {
        return None;
    }
    // Chainlink aggregator answers fit comfortably in i128; take the low 16
    // bytes and sign-extend from the MSB of the full 32-byte word.
    let negative = bytes[0] & 0x80 != 0;
    let mut acc: i128 = if negative { -1 } else { 0 };
    for &b in &bytes[16..] {
        acc = (acc << 8) | i128::from(b);
    }
    Some(acc)
}

fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
