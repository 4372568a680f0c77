use serde::{Deserialize, Serialize};

/// Closed set of query categories the classifier may assign to a natural-language
/// query. Each variant restricts the eligible provider set via [`crate::provider_table::ProviderTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    /// Cryptocurrency or equity price queries ("price of BTC").
    PriceFeed,
    /// Fiat or crypto exchange-rate queries ("EUR/USD", "exchange rate").
    ExchangeRate,
    /// Weather/forecast queries for a location.
    Weather,
    /// Astronomy/space-related queries.
    SpaceData,
    /// Encyclopedic "what is"/"who is" queries.
    Knowledge,
    /// News or general web-search queries.
    NewsOrSearch,
    /// System introspection, or anything the classifier could not place —
    /// fans out to every registered provider.
    Custom,
}

impl QueryType {
    /// The wire token used when a `QueryType` needs to be logged or echoed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceFeed => "price_feed",
            Self::ExchangeRate => "exchange_rate",
            Self::Weather => "weather",
            Self::SpaceData => "space_data",
            Self::Knowledge => "knowledge",
            Self::NewsOrSearch => "news_or_search",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
