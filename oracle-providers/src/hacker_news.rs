//! `NewsOrSearch` provider backed by Algolia's public Hacker News search API.

use async_trait::async_trait;
use oracle_core::{FailureKind, Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::http::{build_client, map_reqwest_err};

const BASE_URL: &str = "https://hn.algolia.com/api/v1/search";

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "objectID")]
    object_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

/// Queries Algolia's Hacker News search index and returns the top hit's
/// title as `Text`, with the story URLs of every returned hit in `metadata`.
pub struct HackerNewsSearchProvider {
    client: reqwest::Client,
    base_url: String,
}

impl Default for HackerNewsSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HackerNewsSearchProvider {
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
impl Provider for HackerNewsSearchProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: "hacker_news",
            weight: 0.4,
            reliability: 0.85,
            latency_ms: 300,
        }
    }

    async fn fetch(&self, query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
        let started = std::time::Instant::now();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("query", query), ("tags", "story")])
            .send()
            .await
            .map_err(|e| map_reqwest_err("hacker_news", &e))?;

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| map_reqwest_err("hacker_news", &e))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let top = parsed.hits.first().ok_or_else(|| {
            ProviderFailure::new(FailureKind::Upstream, "hacker_news: no results".to_string())
        })?;

        let urls: Vec<serde_json::Value> = parsed
            .hits
            .iter()
            .filter_map(|h| h.url.clone())
            .map(serde_json::Value::String)
            .collect();
        let mut metadata = BTreeMap::new();
        metadata.insert("urls".to_string(), serde_json::Value::Array(urls));
        metadata.insert(
            "object_id".to_string(),
            serde_json::Value::String(top.object_id.clone()),
        );

        let value = ResponseValue::Text(top.title.clone().unwrap_or_default());
        let confidence = self.calculate_confidence(&value);
        Ok(Response {
            value,
            confidence,
            source: "hacker_news".to_string(),
            timestamp: chrono::Utc::now(),
            latency_ms,
            metadata,
        })
    }

    fn calculate_confidence(&self, _value: &ResponseValue) -> f64 {
        0.7
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[tokio::test]
    async fn returns_the_top_hit_as_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/")
                .query_param("query", "rust");
            then.status(200).json_body(serde_json::json!({
                "hits": [
                    { "title": "Rust 2.0 announced", "url": "https://example.com/a", "objectID": "1" },
                    { "title": "Other story", "url": "https://example.com/b", "objectID": "2" }
                ]
            }));
        });

        let provider = HackerNewsSearchProvider::with_base_url(server.url("/"));
        let response = provider.fetch("rust", &QueryOptions::default()).await.unwrap();

        mock.assert();
        assert_eq!(response.value, ResponseValue::Text("Rust 2.0 announced".to_string()));
    }

    #[tokio::test]
    async fn empty_hits_are_reported_as_an_upstream_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/");
            then.status(200).json_body(serde_json::json!({ "hits": [] }));
        });

        let provider = HackerNewsSearchProvider::with_base_url(server.url("/"));
        let err = provider.fetch("nothingburger", &QueryOptions::default()).await.unwrap_err();
        assert_eq!(err.kind, oracle_core::FailureKind::Upstream);
    }
}
