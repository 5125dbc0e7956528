//! Per-pool report lines

use amm::{
    format_fiat, AmmRegistry, PairId, Pool, PriceOracle, Result, TokenRegistry,
    DEFAULT_PRICE_IMPACT_THRESHOLD,
};
use rust_decimal::Decimal;
use std::fmt;
use types::precision;

/// Digits shown for token amounts in reports
const AMOUNT_DP: u32 = 6;

/// One token of a pool
#[derive(Debug, Clone, PartialEq)]
pub struct SideReport {
    /// Display spelling of the token
    pub symbol: String,
    /// Whole-unit reserve
    pub reserve: Decimal,
    pub reserve_fiat: Option<Decimal>,
    /// Counter-token amount the pool absorbs before this token's price moves
    /// by the default threshold
    pub depth: Option<Decimal>,
    pub depth_symbol: String,
    pub depth_fiat: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolReport {
    pub pair: PairId,
    pub address: String,
    /// Fiat currency the fiat columns are quoted in
    pub fiat: String,
    pub sides: Vec<SideReport>,
}

impl PoolReport {
    /// Collect report figures from a refreshed pool
    ///
    /// Missing prices leave the fiat columns empty; an unrefreshed pool is an error.
    pub fn build(pool: &Pool, oracle: &PriceOracle, registry: &TokenRegistry) -> Result<Self> {
        let [first, second] = pool.tokens();
        let mut sides = Vec::with_capacity(2);

        for (token, other) in [(first, second), (second, first)] {
            let (Some(raw), Some(reserve)) = (token.balance_base(), token.balance_converted())
            else {
                return Err(amm::AmmError::BalanceNotLoaded {
                    symbol: token.symbol().to_string(),
                    pool: pool.id().clone(),
                });
            };

            let depth = pool
                .spot_price(token.symbol())
                .and_then(|spot| pool.supply_at_price(token.symbol(), spot))
                .ok();
            let depth_fiat = depth.and_then(|d| {
                oracle
                    .price_of(other.symbol())
                    .ok()
                    .and_then(|p| d.checked_mul(p))
            });

            sides.push(SideReport {
                symbol: display(registry, token.symbol()),
                reserve,
                reserve_fiat: oracle.to_fiat(raw, token.symbol()).ok(),
                depth,
                depth_symbol: display(registry, other.symbol()),
                depth_fiat,
            });
        }

        Ok(Self {
            pair: pool.id().clone(),
            address: pool.address().to_string(),
            fiat: oracle.fiat().to_string(),
            sides,
        })
    }
}

impl fmt::Display for PoolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} @ {}", self.pair, self.address)?;
        let pct = (DEFAULT_PRICE_IMPACT_THRESHOLD * Decimal::ONE_HUNDRED).normalize();

        for side in &self.sides {
            write!(
                f,
                "  {:<6} reserve {} ({})",
                side.symbol,
                amount(side.reserve),
                fiat_or_na(side.reserve_fiat, &self.fiat)
            )?;
            match side.depth {
                Some(depth) => writeln!(
                    f,
                    "  {}% depth {} {} ({})",
                    pct,
                    amount(depth),
                    side.depth_symbol,
                    fiat_or_na(side.depth_fiat, &self.fiat)
                )?,
                None => writeln!(f, "  {}% depth n/a", pct)?,
            }
        }
        Ok(())
    }
}

/// One token's total across an AMM's pools
#[derive(Debug, Clone, PartialEq)]
pub struct TotalRow {
    pub symbol: String,
    pub amount: Decimal,
    /// Formatted fiat value, `n/a` when the token has no price
    pub fiat: String,
}

/// Total balance of every token across an AMM's pools, with fiat value
#[derive(Debug, Clone, PartialEq)]
pub struct TotalsReport {
    pub amm: String,
    pub rows: Vec<TotalRow>,
}

impl TotalsReport {
    pub fn build(amm: &AmmRegistry, oracle: &PriceOracle) -> Result<Self> {
        let registry = amm.token_registry();
        let mut rows = Vec::new();

        for info in registry.tokens() {
            if !amm.pools().any(|p| p.token(&info.symbol).is_ok()) {
                continue;
            }
            let total = amm.total_balance(&info.symbol)?;
            rows.push(TotalRow {
                symbol: info.display_symbol().to_string(),
                amount: precision::raw_to_decimal(total, info.decimals)?,
                fiat: oracle
                    .to_fiat_display(total, &info.symbol)
                    .unwrap_or_else(|_| "n/a".to_string()),
            });
        }

        Ok(Self {
            amm: amm.name().to_string(),
            rows,
        })
    }
}

impl fmt::Display for TotalsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} totals", self.amm)?;
        for row in &self.rows {
            writeln!(f, "  {:<6} {} ({})", row.symbol, amount(row.amount), row.fiat)?;
        }
        Ok(())
    }
}

fn display(registry: &TokenRegistry, symbol: &str) -> String {
    registry
        .resolve(symbol)
        .map(|info| info.display_symbol().to_string())
        .unwrap_or_else(|_| symbol.to_string())
}

fn amount(value: Decimal) -> Decimal {
    value.round_dp(AMOUNT_DP).normalize()
}

fn fiat_or_na(value: Option<Decimal>, fiat: &str) -> String {
    value
        .map(|v| format_fiat(v, fiat))
        .unwrap_or_else(|| "n/a".to_string())
}
