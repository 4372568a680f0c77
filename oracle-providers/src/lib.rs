#![doc = include_str!("../README.md")]
//! oracle-providers
//!
//! Concrete, thin `Provider` adapters over public HTTP/RPC APIs, one file
//! per provider: URL construction, response parsing, and
//! `calculate_confidence` all live together, the way a single-capability
//! integration is written without a shared abstraction layer to hide behind.
#![warn(missing_docs)]

mod chainlink;
mod coingecko;
mod dia;
mod frankfurter;
mod hacker_news;
mod http;
mod iss_location;
mod open_meteo;
mod query_parse;
mod wikipedia;

#[cfg(feature = "hedera")]
mod hedera_ledger;

pub use chainlink::ChainlinkProvider;
pub use coingecko::CoinGeckoProvider;
pub use dia::DiaProvider;
pub use frankfurter::FrankfurterProvider;
pub use hacker_news::HackerNewsSearchProvider;
pub use iss_location::IssLocationProvider;
pub use open_meteo::OpenMeteoProvider;
pub use wikipedia::WikipediaProvider;

#[cfg(feature = "hedera")]
pub use hedera_ledger::HederaLedgerClient;
