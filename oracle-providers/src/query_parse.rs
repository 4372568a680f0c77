//! Small heuristics shared by the price/FX providers for pulling a
//! `(base, quote)` asset pair out of free-form query text.
//!
//! None of this is part of the classifier (C5): by the time a query reaches
//! a `Provider::fetch`, it has already been routed by `QueryType`. This is
//! just enough parsing for a thin adapter to know which symbols to ask its
//! upstream about.

/// Extract a `(base, quote)` pair from `query`, defaulting the quote
/// currency to `"usd"` when none is named.
///
/// Recognizes `BTC/USD`, `BTC-USD`, `BTC to USD`, `BTC in USD`, and bare
/// `BTC` (using the default quote). Matching is case-insensitive; the
/// returned strings are lowercased.
#[must_use]
pub fn parse_pair(query: &str, default_quote: &str) -> (String, String) {
    let lower = query.to_lowercase();

    for sep in ["/", "-"] {
        if let Some((base, quote)) = lower.split_once(sep) {
            return (clean_symbol(base), clean_symbol(quote));
        }
    }
    for sep in [" to ", " in ", " vs "] {
        if let Some((base, quote)) = lower.split_once(sep) {
            return (clean_symbol(base), clean_symbol(quote));
        }
    }

    (clean_symbol(&lower), default_quote.to_string())
}

fn clean_symbol(raw: &str) -> String {
    raw.split_whitespace()
        .last()
        .unwrap_or(raw)
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_pair_is_split() {
        assert_eq!(parse_pair("BTC/USD", "usd"), ("btc".into(), "usd".into()));
    }

    #[test]
    fn natural_language_pair_is_split() {
        assert_eq!(
            parse_pair("price of ETH in EUR", "usd"),
            ("eth".into(), "eur".into())
        );
    }

    #[test]
    fn bare_symbol_uses_default_quote() {
        assert_eq!(parse_pair("bitcoin", "usd"), ("bitcoin".into(), "usd".into()));
    }
}
