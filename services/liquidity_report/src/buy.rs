//! `--buy SYMBOL:AMOUNT` previews

use amm::{format_fiat, PairId, Pool, PriceOracle, Result};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use types::precision;

/// Whole units of a token to quote a purchase for
#[derive(Debug, Clone, PartialEq)]
pub struct BuyRequest {
    pub symbol: String,
    pub amount: Decimal,
}

impl FromStr for BuyRequest {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (symbol, amount) = s
            .split_once(':')
            .ok_or_else(|| format!("expected SYMBOL:AMOUNT, got {s:?}"))?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(format!("missing symbol in {s:?}"));
        }
        let amount = Decimal::from_str(amount.trim())
            .map_err(|e| format!("invalid amount in {s:?}: {e}"))?;
        if amount <= Decimal::ZERO {
            return Err(format!("amount must be positive in {s:?}"));
        }
        Ok(Self {
            symbol: symbol.to_string(),
            amount,
        })
    }
}

/// Cost of a previewed buy in one pool; the pool itself is left untouched
#[derive(Debug, Clone, PartialEq)]
pub struct BuyQuote {
    pub pair: PairId,
    pub bought: String,
    pub amount: Decimal,
    pub paid_with: String,
    pub paid: Decimal,
    pub paid_fiat: Option<Decimal>,
}

impl BuyQuote {
    pub fn preview(pool: &Pool, oracle: &PriceOracle, request: &BuyRequest) -> Result<Self> {
        let bought = pool.token(&request.symbol)?;
        let raw_amount = precision::decimal_to_raw(request.amount, bought.decimals())?;

        let preview = pool.preview_buy(&request.symbol, raw_amount)?;
        let paid_with = pool.token(&preview.paid_with)?;
        let paid = precision::raw_to_decimal(preview.tokens_paid, paid_with.decimals())?;

        Ok(Self {
            pair: pool.id().clone(),
            bought: preview.bought,
            amount: request.amount,
            paid_with: preview.paid_with,
            paid,
            paid_fiat: oracle.to_fiat(preview.tokens_paid, paid_with.symbol()).ok(),
        })
    }

    pub fn render(&self, fiat: &str) -> String {
        let cost = self
            .paid_fiat
            .map(|v| format_fiat(v, fiat))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "{}: buying {} {} costs {} {} ({})",
            self.pair,
            self.amount.normalize(),
            self.bought,
            self.paid.normalize(),
            self.paid_with,
            cost
        )
    }
}

impl fmt::Display for BuyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.amount)
    }
}
