//! `SpaceData` provider backed by the public Open Notify APIs.

use async_trait::async_trait;
use oracle_core::{Provider, ProviderFailure, ProviderMeta};
use oracle_types::{QueryOptions, Response, ResponseValue};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::http::{build_client, malformed, map_reqwest_err};

const ISS_NOW_URL: &str = "http://api.open-notify.org/iss-now.json";
const ASTROS_URL: &str = "http://api.open-notify.org/astros.json";

#[derive(Debug, Deserialize)]
struct IssPosition {
    latitude: String,
    longitude: String,
}

#[derive(Debug, Deserialize)]
struct IssNowResponse {
    iss_position: IssPosition,
}

#[derive(Debug, Deserialize)]
struct Astronaut {
    name: String,
    craft: String,
}

#[derive(Debug, Deserialize)]
struct AstrosResponse {
    number: u32,
    people: Vec<Astronaut>,
}

/// Combines Open Notify's `iss-now` position feed with its `astros` crew
/// census into a single structured value.
pub struct IssLocationProvider {
    client: reqwest::Client,
    iss_now_url: String,
    astros_url: String,
}

impl Default for IssLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IssLocationProvider {
    /// Build a provider with its own HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_urls(ISS_NOW_URL.to_string(), ASTROS_URL.to_string())
    }

    /// Build a provider against caller-supplied endpoints (e.g. a mock
    /// server for tests).
    #[must_use]
    pub fn with_urls(iss_now_url: String, astros_url: String) -> Self {
        Self {
            client: build_client(),
            iss_now_url,
            astros_url,
        }
    }
}

#[async_trait]
impl Provider for IssLocationProvider {
    fn meta(&self) -> ProviderMeta {
        ProviderMeta {
            name: "iss_location",
            weight: 0.5,
            reliability: 0.92,
            latency_ms: 350,
        }
    }

    async fn fetch(&self, _query: &str, _options: &QueryOptions) -> Result<Response, ProviderFailure> {
        let started = std::time::Instant::now();

        let position: IssNowResponse = self
            .client
            .get(&self.iss_now_url)
            .send()
            .await
            .map_err(|e| map_reqwest_err("iss_location", &e))?
            .json()
            .await
            .map_err(|e| map_reqwest_err("iss_location", &e))?;

        let astros: AstrosResponse = self
            .client
            .get(&self.astros_url)
            .send()
            .await
            .map_err(|e| map_reqwest_err("iss_location", &e))?
            .json()
            .await
            .map_err(|e| map_reqwest_err("iss_location", &e))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let lat: f64 = position
            .iss_position
            .latitude
            .parse()
            .map_err(|_| malformed("iss_location", "non-numeric latitude"))?;
        let lon: f64 = position
            .iss_position
            .longitude
            .parse()
            .map_err(|_| malformed("iss_location", "non-numeric longitude"))?;

        let crew: Vec<Value> = astros
            .people
            .iter()
            .filter(|p| p.craft == "ISS")
            .map(|p| Value::String(p.name.clone()))
            .collect();

        let mut fields = BTreeMap::new();
        fields.insert("latitude".to_string(), Value::from(lat));
        fields.insert("longitude".to_string(), Value::from(lon));
        fields.insert("crew".to_string(), Value::Array(crew));
        fields.insert("crew_total".to_string(), Value::from(astros.number));

        let value = ResponseValue::Struct(fields);
        let confidence = self.calculate_confidence(&value);
        Ok(Response {
            value,
            confidence,
            source: "iss_location".to_string(),
            timestamp: chrono::Utc::now(),
            latency_ms,
            metadata: BTreeMap::new(),
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
    async fn combines_position_and_crew_into_one_struct() {
        let server = MockServer::start();
        let position_mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/iss-now.json");
            then.status(200).json_body(serde_json::json!({
                "iss_position": { "latitude": "12.34", "longitude": "-56.78" }
            }));
        });
        let astros_mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/astros.json");
            then.status(200).json_body(serde_json::json!({
                "number": 2,
                "people": [
                    { "name": "Jane Doe", "craft": "ISS" },
                    { "name": "John Roe", "craft": "Tiangong" }
                ]
            }));
        });

        let provider =
            IssLocationProvider::with_urls(server.url("/iss-now.json"), server.url("/astros.json"));
        let response = provider.fetch("where is the ISS", &QueryOptions::default()).await.unwrap();

        position_mock.assert();
        astros_mock.assert();
        match response.value {
            ResponseValue::Struct(fields) => {
                assert_eq!(fields["latitude"], serde_json::json!(12.34));
                assert_eq!(fields["crew"], serde_json::json!(["Jane Doe"]));
                assert_eq!(fields["crew_total"], serde_json::json!(2));
            }
            other => panic!("expected a struct value, got {other:?}"),
        }
    }
}
