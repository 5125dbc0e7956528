//! Fiat spot prices and raw-balance → fiat conversion
//!
//! The price map is replaced as a whole: a load either installs a price for
//! every requested symbol or leaves the oracle exactly as it was.

use crate::error::{AmmError, Result};
use crate::pool_traits::PriceFeed;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use types::{precision, TokenRegistry, U256};

/// Digits after the point in formatted fiat amounts
pub const DISPLAY_DECIMALS: u32 = 5;

/// Values below this magnitude are shown as zero
const DISPLAY_FLOOR: Decimal = dec!(0.00001);

/// Current spot prices keyed by canonical symbol
#[derive(Debug, Clone)]
pub struct PriceOracle {
    registry: Arc<TokenRegistry>,
    fiat: String,
    prices: HashMap<String, Decimal>,
}

impl PriceOracle {
    /// Fetch prices for `symbols` and build an oracle from them
    ///
    /// Fails wholesale if the feed errors or leaves out any symbol.
    pub async fn load(
        feed: &dyn PriceFeed,
        registry: Arc<TokenRegistry>,
        symbols: &[&str],
        fiat: &str,
    ) -> Result<Self> {
        let mut oracle = Self::empty(registry, fiat);
        oracle.refresh(feed, symbols).await?;
        Ok(oracle)
    }

    /// Oracle with no prices loaded
    pub fn empty(registry: Arc<TokenRegistry>, fiat: &str) -> Self {
        Self {
            registry,
            fiat: fiat.to_lowercase(),
            prices: HashMap::new(),
        }
    }

    /// Oracle over prices obtained elsewhere
    pub fn from_prices<'a>(
        registry: Arc<TokenRegistry>,
        fiat: &str,
        prices: impl IntoIterator<Item = (&'a str, Decimal)>,
    ) -> Result<Self> {
        let mut map = HashMap::new();
        for (symbol, price) in prices {
            let canonical = registry.resolve(symbol)?.symbol.clone();
            map.insert(canonical, price);
        }
        Ok(Self {
            registry,
            fiat: fiat.to_lowercase(),
            prices: map,
        })
    }

    /// Replace every price with a fresh batch for `symbols`
    pub async fn refresh(&mut self, feed: &dyn PriceFeed, symbols: &[&str]) -> Result<()> {
        // provider id → canonical symbols priced by it
        let mut wanted: Vec<(String, String)> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let info = self.registry.resolve(symbol)?;
            let id = info.price_id.clone().ok_or_else(|| AmmError::PriceFetch {
                reason: format!("no price id configured for {}", info.symbol),
            })?;
            if !wanted.iter().any(|(_, s)| s == &info.symbol) {
                wanted.push((id, info.symbol.clone()));
            }
        }

        let mut ids: Vec<String> = wanted.iter().map(|(id, _)| id.clone()).collect();
        ids.sort();
        ids.dedup();

        debug!(ids = ?ids, fiat = %self.fiat, "Requesting spot prices");
        let quoted = feed
            .fetch_prices(&ids, &self.fiat)
            .await
            .map_err(|e| AmmError::PriceFetch {
                reason: format!("{e:#}"),
            })?;

        let mut prices = HashMap::with_capacity(wanted.len());
        for (id, symbol) in wanted {
            let price = quoted.get(&id).copied().ok_or_else(|| AmmError::PriceFetch {
                reason: format!("response is missing {id} ({symbol}) in {}", self.fiat),
            })?;
            prices.insert(symbol, price);
        }

        info!(count = prices.len(), fiat = %self.fiat, "Spot prices loaded");
        self.prices = prices;
        Ok(())
    }

    pub fn fiat(&self) -> &str {
        &self.fiat
    }

    /// Loaded canonical symbols, sorted
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.prices.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn price_of(&self, symbol: &str) -> Result<Decimal> {
        let canonical = self.registry.normalize(symbol);
        self.prices
            .get(canonical)
            .copied()
            .ok_or_else(|| AmmError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    /// `raw / 10^decimals * price`
    pub fn to_fiat(&self, raw_amount: U256, symbol: &str) -> Result<Decimal> {
        let decimals = self.registry.decimals(symbol)?;
        let price = self.price_of(symbol)?;
        let amount = precision::raw_to_decimal(raw_amount, decimals)?;
        amount
            .checked_mul(price)
            .ok_or_else(|| AmmError::ArithmeticOverflow(format!("{amount} {symbol} at {price}")))
    }

    /// Fiat value formatted for reports, e.g. `$2000.00000`
    pub fn to_fiat_display(&self, raw_amount: U256, symbol: &str) -> Result<String> {
        let value = self.to_fiat(raw_amount, symbol)?;
        Ok(format_fiat(value, &self.fiat))
    }
}

/// Format with five decimals, ties to even; magnitudes below 0.00001 print
/// as a bare zero
///
/// The currency sign always leads: `-1.5` usd is `$-1.50000`.
pub fn format_fiat(value: Decimal, fiat: &str) -> String {
    let sign = currency_sign(fiat);
    if value.abs() < DISPLAY_FLOOR {
        return format!("{sign}0");
    }
    let mut rounded =
        value.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(DISPLAY_DECIMALS);
    format!("{sign}{rounded}")
}

fn currency_sign(fiat: &str) -> String {
    match fiat.to_lowercase().as_str() {
        "usd" => "$".to_string(),
        "eur" => "€".to_string(),
        "gbp" => "£".to_string(),
        "jpy" => "¥".to_string(),
        other => format!("{} ", other.to_uppercase()),
    }
}
