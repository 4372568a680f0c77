//! Fixed `QueryType -> eligible provider names` lookup.
//!
//! The upstream workspace this crate is descended from routes many
//! capability kinds across many asset kinds and exchanges via a
//! specificity-resolved `RoutingPolicy`. This pipeline has exactly one
//! capability (`fetch`) and a closed seven-value `QueryType`, so a flat table
//! is the faithful-scope replacement rather than porting that generality.

use std::collections::HashMap;

use crate::query::QueryType;

/// Maps each `QueryType` to the provider names eligible to answer it.
#[derive(Debug, Clone)]
pub struct ProviderTable {
    eligible: HashMap<QueryType, Vec<String>>,
}

impl ProviderTable {
    /// An empty table; every `QueryType` other than `Custom` has no eligible providers
    /// until entries are added.
    #[must_use]
    pub fn new() -> Self {
        Self {
            eligible: HashMap::new(),
        }
    }

    /// Register `provider` as eligible to answer queries of `query_type`.
    pub fn add(&mut self, query_type: QueryType, provider: impl Into<String>) -> &mut Self {
        self.eligible
            .entry(query_type)
            .or_default()
            .push(provider.into());
        self
    }

    /// The fixed eligible set for `query_type`, absent any explicit `sources` override.
    ///
    /// `Custom` is handled by the caller (it resolves to "every registered
    /// provider", which this table — scoped to query-type routing, not the
    /// registry — does not itself enumerate).
    #[must_use]
    pub fn eligible_for(&self, query_type: QueryType) -> &[String] {
        self.eligible
            .get(&query_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A table pre-populated with the example mapping from the design notes:
    /// `PriceFeed -> {chainlink, coingecko, dia}`, `ExchangeRate -> {frankfurter}`,
    /// `Weather -> {weather}`, `SpaceData -> {iss_location}`, `Knowledge -> {wikipedia}`,
    /// `NewsOrSearch -> {hacker_news}`.
    #[must_use]
    pub fn with_default_providers() -> Self {
        let mut table = Self::new();
        table
            .add(QueryType::PriceFeed, "chainlink")
            .add(QueryType::PriceFeed, "coingecko")
            .add(QueryType::PriceFeed, "dia")
            .add(QueryType::ExchangeRate, "frankfurter")
            .add(QueryType::Weather, "weather")
            .add(QueryType::SpaceData, "iss_location")
            .add(QueryType::Knowledge, "wikipedia")
            .add(QueryType::NewsOrSearch, "hacker_news");
        table
    }
}

impl Default for ProviderTable {
    fn default() -> Self {
        Self::new()
    }
}
