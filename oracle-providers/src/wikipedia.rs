//! `Knowledge` provider backed by the Wikipedia REST summary endpoint.

use async_trait::async_trait;
use oracle_core::{Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::http::{build_client, map_reqwest_err};

const BASE_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    extract: String,
    #[serde(default)]
    title: String,
}

/// Queries Wikipedia's page-summary endpoint for a title guessed from the
/// query text (whitespace is title-cased into the article title, which is
/// how Wikipedia's summary endpoint itself expects a topic to be named).
pub struct WikipediaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl Default for WikipediaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WikipediaProvider {
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

fn guess_title(query: &str) -> String {
    let stripped = query
        .trim()
        .trim_start_matches("what is")
        .trim_start_matches("who is")
        .trim_end_matches('?')
        .trim();
    stripped
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

#[async_trait]
impl Provider for WikipediaProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: "wikipedia",
            weight: 0.6,
            reliability: 0.9,
            latency_ms: 250,
        }
    }

    async fn fetch(&self, query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
        let title = guess_title(query);
        let url = format!("{}/{title}", self.base_url);

        let started = std::time::Instant::now();
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_reqwest_err("wikipedia", &e))?;

        let parsed: SummaryResponse = resp
            .json()
            .await
            .map_err(|e| map_reqwest_err("wikipedia", &e))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "title".to_string(),
            serde_json::Value::String(parsed.title),
        );

        let value = ResponseValue::Text(parsed.extract);
        let confidence = self.calculate_confidence(&value);
        Ok(Response {
            value,
            confidence,
            source: "wikipedia".to_string(),
            timestamp: chrono::Utc::now(),
            latency_ms,
            metadata,
        })
    }

    fn calculate_confidence(&self, _value: &ResponseValue) -> f64 {
        0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[test]
    fn guesses_title_from_question() {
        assert_eq!(guess_title("what is the eiffel tower?"), "The_Eiffel_Tower");
    }

    #[tokio::test]
    async fn fetches_and_parses_a_summary() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/Rust_(programming_language)");
            then.status(200).json_body(serde_json::json!({
                "title": "Rust (programming language)",
                "extract": "Rust is a multi-paradigm systems programming language."
            }));
        });

        let provider = WikipediaProvider::with_base_url(server.url(""));
        let response = provider
            .fetch("what is rust (programming language)", &QueryOptions::default())
            .await
            .unwrap();

        mock.assert();
        assert_eq!(
            response.value,
            ResponseValue::Text("Rust is a multi-paradigm systems programming language.".to_string())
        );
    }
}
