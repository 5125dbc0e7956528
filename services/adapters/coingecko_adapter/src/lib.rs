//! CoinGecko Price Adapter
//!
//! Batched spot-price lookups against the CoinGecko `simple/price` endpoint,
//! exposed to the pool model as an [`amm::PriceFeed`].

pub mod config;
pub mod feed;

pub use crate::config::CoinGeckoConfig;
pub use feed::{parse_simple_price, CoinGeckoError, CoinGeckoFeed};
