//! The query-type classifier (C5): a pure, deterministic heuristic mapping
//! natural-language text to a [`QueryType`], which in turn restricts the
//! eligible provider set via [`oracle_types::ProviderTable`].
//!
//! Deliberately conservative: an input that matches none of the ordered
//! rules below falls through to `Custom`, which fans out to every
//! registered provider rather than none — under-classifying is cheaper to
//! recover from than silently narrowing an answer.

use oracle_types::QueryType;

const SYSTEM_KEYWORDS: &[&str] = &["status", "health", "provider", "balance"];
const PRICE_KEYWORDS: &[&str] = &["price", "cost", "value", "worth"];
const CRYPTO_TICKERS: &[&str] = &[
    "btc", "bitcoin", "eth", "ethereum", "link", "chainlink", "sol", "solana", "doge",
];
const FX_KEYWORDS: &[&str] = &["exchange rate", "exchange", "fx", "forex", "convert"];
const FIAT_CODES: &[&str] = &[
    "usd", "eur", "gbp", "jpy", "chf", "cad", "aud", "nzd", "cny",
];
const WEATHER_KEYWORDS: &[&str] = &[
    "weather",
    "temperature",
    "forecast",
    "rain",
    "raining",
    "snow",
    "humidity",
    "windy",
];
const NEWS_KEYWORDS: &[&str] = &["news", "search for", "headline", "article", "latest on"];
const SPACE_KEYWORDS: &[&str] = &[
    "space",
    "astronaut",
    "satellite",
    "orbit",
    "iss",
    "rocket",
    "launch",
    "mars",
    "nasa",
];
const KNOWLEDGE_PHRASES: &[&str] = &["what is", "what are", "who is", "who was", "explain", "define"];

/// Classify `text` into a [`QueryType`] via an ordered sequence of keyword
/// rules. Pure and deterministic — the same input always yields the same
/// output, with no reliance on any mutable or external state.
#[must_use]
pub fn classify(text: &str) -> QueryType {
    let lower = text.to_lowercase();

    if contains_any(&lower, SYSTEM_KEYWORDS) {
        return QueryType::Custom;
    }
    if contains_any(&lower, PRICE_KEYWORDS) || contains_any(&lower, CRYPTO_TICKERS) {
        return QueryType::PriceFeed;
    }
    if contains_any(&lower, FX_KEYWORDS) || looks_like_fx_pair(&lower) || contains_any(&lower, FIAT_CODES) {
        return QueryType::ExchangeRate;
    }
    if contains_any(&lower, WEATHER_KEYWORDS) {
        return QueryType::Weather;
    }
    if contains_any(&lower, NEWS_KEYWORDS) {
        return QueryType::NewsOrSearch;
    }
    if contains_any(&lower, SPACE_KEYWORDS) {
        return QueryType::SpaceData;
    }
    if contains_any(&lower, KNOWLEDGE_PHRASES) {
        return QueryType::Knowledge;
    }
    QueryType::Custom
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Recognizes a bare `X/Y` style pair such as `"eur/usd"` or `"btc/eth"`,
/// per the design note's FX-pattern rule.
fn looks_like_fx_pair(text: &str) -> bool {
    text.split_whitespace().any(|tok| {
        let tok = tok.trim_matches(|c: char| !c.is_alphanumeric() && c != '/');
        match tok.split('/').collect::<Vec<_>>().as_slice() {
            [a, b] => a.len() >= 2 && a.len() <= 5 && b.len() >= 2 && b.len() <= 5,
            _ => false,
        }
    })
}
