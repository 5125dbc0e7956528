//! Two-token constant-product pool
//!
//! A [`Pool`] owns exactly two [`Token`]s in a fixed array. Callers address a
//! side by symbol (canonical or alias); the side is found by equality on the
//! normalized symbol.
//!
//! Reserve updates are two-phase: new raw balances are first converted for
//! both sides, and only when both conversions succeed are the two tokens
//! written. A refresh or simulated trade therefore never leaves one side
//! updated and the other stale.

use crate::error::{AmmError, Result};
use crate::pool_traits::BalanceReader;
use crate::v2_math::{V2Math, DEFAULT_PRICE_IMPACT_THRESHOLD};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use types::{precision, PairId, TokenRegistry, U256};

/// One token of a pool with its live balance
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    symbol: String,
    address: String,
    decimals: u8,
    balance_base: Option<U256>,
    balance_converted: Option<Decimal>,
}

impl Token {
    /// Copy identity and precision out of the registry
    pub fn from_registry(registry: &TokenRegistry, symbol: &str) -> Result<Self> {
        let info = registry.resolve(symbol)?;
        Ok(Self {
            symbol: info.symbol.clone(),
            address: info.address.clone(),
            decimals: info.decimals,
            balance_base: None,
            balance_converted: None,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Raw on-chain balance, `None` until the first refresh
    pub fn balance_base(&self) -> Option<U256> {
        self.balance_base
    }

    /// `balance_base / 10^decimals`, `None` until the first refresh
    pub fn balance_converted(&self) -> Option<Decimal> {
        self.balance_converted
    }

    fn convert(&self, raw: U256) -> Result<Decimal> {
        Ok(precision::raw_to_decimal(raw, self.decimals)?)
    }

    fn commit(&mut self, raw: U256, converted: Decimal) {
        self.balance_base = Some(raw);
        self.balance_converted = Some(converted);
    }
}

/// Result of a buy that has not been committed to the pool
#[derive(Debug, Clone, PartialEq)]
pub struct SwapPreview {
    /// Canonical symbol of the token bought
    pub bought: String,
    /// Canonical symbol of the token paid with
    pub paid_with: String,
    /// Raw units bought
    pub amount_out: U256,
    /// Raw units of `paid_with` the buy costs
    pub tokens_paid: U256,
    /// Raw reserves after the trade, in pool token order
    pub reserves: [U256; 2],
}

/// Saved token state for rolling back a committed simulation
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSnapshot {
    pair: PairId,
    tokens: [Token; 2],
}

/// Token pair with constant-product reserves
#[derive(Debug, Clone)]
pub struct Pool {
    id: PairId,
    address: String,
    tokens: [Token; 2],
    fee_bps: u32,
    registry: Arc<TokenRegistry>,
}

impl Pool {
    /// Create a pool for two distinct registered symbols
    ///
    /// Token order follows the arguments; the pool id does not.
    pub fn new(
        registry: Arc<TokenRegistry>,
        symbol_a: &str,
        symbol_b: &str,
        address: impl Into<String>,
    ) -> Result<Self> {
        let token_a = Token::from_registry(&registry, symbol_a)?;
        let token_b = Token::from_registry(&registry, symbol_b)?;
        if token_a.symbol == token_b.symbol {
            return Err(AmmError::IdenticalTokens {
                symbol: token_a.symbol,
            });
        }

        Ok(Self {
            id: PairId::new(&token_a.symbol, &token_b.symbol),
            address: address.into(),
            tokens: [token_a, token_b],
            fee_bps: 0,
            registry,
        })
    }

    /// Charge `fee_bps` on the input side of simulated buys
    pub fn with_fee_bps(mut self, fee_bps: u32) -> Result<Self> {
        if fee_bps >= crate::v2_math::BPS_DENOMINATOR {
            return Err(AmmError::InvalidFee { fee_bps });
        }
        self.fee_bps = fee_bps;
        Ok(self)
    }

    pub fn id(&self) -> &PairId {
        &self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    pub fn tokens(&self) -> &[Token; 2] {
        &self.tokens
    }

    /// Token addressed by canonical symbol or alias
    pub fn token(&self, symbol: &str) -> Result<&Token> {
        self.side(symbol).map(|idx| &self.tokens[idx])
    }

    /// Both tokens have been loaded at least once
    pub fn is_loaded(&self) -> bool {
        self.tokens.iter().all(|t| t.balance_base.is_some())
    }

    fn side(&self, symbol: &str) -> Result<usize> {
        let canonical = self.registry.normalize(symbol);
        self.tokens
            .iter()
            .position(|t| t.symbol == canonical)
            .ok_or_else(|| AmmError::UnknownToken {
                symbol: symbol.to_string(),
                pool: self.id.clone(),
            })
    }

    fn reserve(&self, idx: usize) -> Result<U256> {
        self.tokens[idx]
            .balance_base
            .ok_or_else(|| self.not_loaded(idx))
    }

    fn converted_reserve(&self, idx: usize) -> Result<Decimal> {
        self.tokens[idx]
            .balance_converted
            .ok_or_else(|| self.not_loaded(idx))
    }

    fn not_loaded(&self, idx: usize) -> AmmError {
        AmmError::BalanceNotLoaded {
            symbol: self.tokens[idx].symbol.clone(),
            pool: self.id.clone(),
        }
    }

    /// Read both raw balances without touching pool state
    pub async fn fetch_balances(&self, reader: &dyn BalanceReader) -> Result<[U256; 2]> {
        let (first, second) = futures::try_join!(
            self.fetch_one(reader, 0),
            self.fetch_one(reader, 1)
        )?;
        Ok([first, second])
    }

    async fn fetch_one(&self, reader: &dyn BalanceReader, idx: usize) -> Result<U256> {
        let token = &self.tokens[idx];
        reader
            .balance_of(&token.address, &self.address)
            .await
            .map_err(|e| AmmError::BalanceFetch {
                pool: self.id.clone(),
                token: token.symbol.clone(),
                reason: format!("{e:#}"),
            })
    }

    /// Replace both raw balances, recomputing converted forms
    ///
    /// Either both tokens change or neither does.
    pub fn apply_balances(&mut self, balances: [U256; 2]) -> Result<()> {
        let converted = self.convert_balances(balances)?;
        self.commit_balances(balances, converted);
        Ok(())
    }

    pub(crate) fn convert_balances(&self, balances: [U256; 2]) -> Result<[Decimal; 2]> {
        Ok([
            self.tokens[0].convert(balances[0])?,
            self.tokens[1].convert(balances[1])?,
        ])
    }

    pub(crate) fn commit_balances(&mut self, balances: [U256; 2], converted: [Decimal; 2]) {
        for (idx, token) in self.tokens.iter_mut().enumerate() {
            token.commit(balances[idx], converted[idx]);
        }
    }

    /// Pull current reserves from the balance reader
    ///
    /// On error the previous reserves are kept.
    pub async fn refresh_balances(&mut self, reader: &dyn BalanceReader) -> Result<()> {
        let balances = self.fetch_balances(reader).await?;
        self.apply_balances(balances)?;
        debug!(
            pool = %self.id,
            reserve0 = %balances[0],
            reserve1 = %balances[1],
            "Pool balances refreshed"
        );
        Ok(())
    }

    /// Quote buying exactly `amount` raw units of `symbol` without committing
    pub fn preview_buy(&self, symbol: &str, amount: U256) -> Result<SwapPreview> {
        let buy = self.side(symbol)?;
        let sell = 1 - buy;

        let quote = V2Math::calculate_input_amount(
            &self.tokens[buy].symbol,
            amount,
            self.reserve(sell)?,
            self.reserve(buy)?,
            self.fee_bps,
        )?;

        let mut reserves = [U256::zero(); 2];
        reserves[buy] = quote.new_reserve_out;
        reserves[sell] = quote.new_reserve_in;

        Ok(SwapPreview {
            bought: self.tokens[buy].symbol.clone(),
            paid_with: self.tokens[sell].symbol.clone(),
            amount_out: amount,
            tokens_paid: quote.amount_in,
            reserves,
        })
    }

    /// Buy exactly `amount` raw units of `symbol` and commit the new reserves
    ///
    /// Returns the raw units of the other token paid. Use [`preview_buy`]
    /// or [`snapshot`]/[`restore`] when the pool must stay unchanged.
    ///
    /// [`preview_buy`]: Self::preview_buy
    /// [`snapshot`]: Self::snapshot
    /// [`restore`]: Self::restore
    pub fn simulate_buy(&mut self, symbol: &str, amount: U256) -> Result<U256> {
        let preview = self.preview_buy(symbol, amount)?;
        self.apply_balances(preview.reserves)?;
        debug!(
            pool = %self.id,
            bought = %preview.bought,
            amount = %amount,
            paid = %preview.tokens_paid,
            "Simulated buy committed"
        );
        Ok(preview.tokens_paid)
    }

    /// Liquidity depth within the default 5% price move
    pub fn supply_at_price(&self, symbol: &str, initial_price: Decimal) -> Result<Decimal> {
        self.supply_at_price_with_threshold(symbol, initial_price, DEFAULT_PRICE_IMPACT_THRESHOLD)
    }

    /// Liquidity depth within a `threshold` price move
    ///
    /// `initial_price` is the price of `symbol` quoted in the other token;
    /// the result is in converted units of the other token.
    pub fn supply_at_price_with_threshold(
        &self,
        symbol: &str,
        initial_price: Decimal,
        threshold: Decimal,
    ) -> Result<Decimal> {
        self.side(symbol)?;
        V2Math::supply_at_price(
            self.converted_reserve(0)?,
            self.converted_reserve(1)?,
            initial_price,
            threshold,
        )
    }

    /// Price of one whole `symbol` in whole units of the other token
    pub fn spot_price(&self, symbol: &str) -> Result<Decimal> {
        let base = self.side(symbol)?;
        V2Math::spot_price(self.converted_reserve(base)?, self.converted_reserve(1 - base)?)
    }

    /// `reserve0 * reserve1` in raw units
    pub fn constant_product(&self) -> Result<U256> {
        self.reserve(0)?
            .checked_mul(self.reserve(1)?)
            .ok_or_else(|| AmmError::ArithmeticOverflow(format!("constant product of {}", self.id)))
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            pair: self.id.clone(),
            tokens: self.tokens.clone(),
        }
    }

    /// Restore balances saved by [`snapshot`](Self::snapshot)
    ///
    /// A snapshot taken from a different pair is rejected as `PoolNotFound`.
    pub fn restore(&mut self, snapshot: PoolSnapshot) -> Result<()> {
        if snapshot.pair != self.id {
            return Err(AmmError::PoolNotFound {
                pair: snapshot.pair,
            });
        }
        self.tokens = snapshot.tokens;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use types::TokenInfo;

    fn registry() -> Arc<TokenRegistry> {
        Arc::new(
            TokenRegistry::builder()
                .token(TokenInfo::new("ETH", "0xeth", 18))
                .token(TokenInfo::new("USDC", "0xusdc", 6))
                .token(TokenInfo::new("WBTC", "0xwbtc", 8).with_display("wBTC"))
                .alias("zETH", "ETH")
                .build()
                .unwrap(),
        )
    }

    fn eth_usdc() -> Pool {
        let mut pool = Pool::new(registry(), "ETH", "USDC", "0xpool").unwrap();
        pool.apply_balances([
            U256::from_dec_str("10000000000000000000").unwrap(),
            U256::from(20_000_000_000u64),
        ])
        .unwrap();
        pool
    }

    #[test]
    fn test_new_pool_resolves_tokens() {
        let pool = Pool::new(registry(), "USDC", "ETH", "0xpool").unwrap();
        assert_eq!(pool.id().as_str(), "ETH/USDC");
        assert_eq!(pool.tokens()[0].symbol(), "USDC");
        assert_eq!(pool.tokens()[1].decimals(), 18);
        assert!(!pool.is_loaded());
    }

    #[test]
    fn test_new_pool_rejects_unknown_and_identical() {
        assert!(matches!(
            Pool::new(registry(), "ETH", "DOGE", "0x1"),
            Err(AmmError::UnknownSymbol { .. })
        ));
        assert!(matches!(
            Pool::new(registry(), "ETH", "zETH", "0x1"),
            Err(AmmError::IdenticalTokens { .. })
        ));
    }

    #[test]
    fn test_token_lookup_by_alias() {
        let pool = Pool::new(registry(), "wBTC", "ETH", "0x1").unwrap();
        assert_eq!(pool.token("wBTC").unwrap().symbol(), "WBTC");
        assert_eq!(pool.token("zETH").unwrap().symbol(), "ETH");
        assert!(matches!(
            pool.token("USDC"),
            Err(AmmError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_apply_balances_converts() {
        let pool = eth_usdc();
        assert_eq!(pool.token("ETH").unwrap().balance_converted(), Some(dec!(10)));
        assert_eq!(pool.token("USDC").unwrap().balance_converted(), Some(dec!(20000)));
    }

    #[test]
    fn test_simulate_buy_eth() {
        let mut pool = eth_usdc();
        let paid = pool
            .simulate_buy("ETH", U256::from(1_000_000_000_000_000_000u64))
            .unwrap();
        assert_eq!(paid, U256::from(2_222_222_222u64));
        assert_eq!(pool.token("ETH").unwrap().balance_converted(), Some(dec!(9)));
        assert_eq!(
            pool.token("USDC").unwrap().balance_converted(),
            Some(dec!(22222.222222))
        );
    }

    #[test]
    fn test_simulate_buy_before_refresh() {
        let mut pool = Pool::new(registry(), "ETH", "USDC", "0xpool").unwrap();
        assert!(matches!(
            pool.simulate_buy("ETH", U256::one()),
            Err(AmmError::BalanceNotLoaded { .. })
        ));
    }

    #[test]
    fn test_simulate_buy_insufficient_liquidity_leaves_pool() {
        let mut pool = eth_usdc();
        let before = pool.snapshot();
        let err = pool
            .simulate_buy("USDC", U256::from(20_000_000_000u64))
            .unwrap_err();
        assert!(matches!(err, AmmError::InsufficientLiquidity { .. }));
        assert_eq!(pool.snapshot(), before);
    }

    #[test]
    fn test_preview_does_not_commit() {
        let pool = eth_usdc();
        let before = pool.snapshot();
        let preview = pool.preview_buy("USDC", U256::from(1_000_000_000u64)).unwrap();
        assert_eq!(preview.bought, "USDC");
        assert_eq!(preview.paid_with, "ETH");
        assert_eq!(pool.snapshot(), before);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut pool = eth_usdc();
        let saved = pool.snapshot();
        pool.simulate_buy("ETH", U256::from(5u64)).unwrap();
        pool.restore(saved.clone()).unwrap();
        assert_eq!(pool.snapshot(), saved);
    }

    #[test]
    fn test_spot_price_and_depth() {
        let pool = eth_usdc();
        let price = pool.spot_price("ETH").unwrap();
        assert_eq!(price, dec!(2000));

        // at the spot price sqrt(p * k) is the USDC reserve
        let depth = pool.supply_at_price("ETH", price).unwrap();
        let expected = dec!(20000) * (dec!(1) - V2Math::decimal_sqrt(dec!(0.95)).unwrap());
        assert!((depth - expected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_fee_pool_charges_more() {
        let mut plain = eth_usdc();
        let mut with_fee = eth_usdc().with_fee_bps(30).unwrap();
        let amount = U256::from(100_000_000_000_000_000u64);
        let plain_paid = plain.simulate_buy("ETH", amount).unwrap();
        let fee_paid = with_fee.simulate_buy("ETH", amount).unwrap();
        assert_eq!(plain_paid, U256::from(202_020_202u64));
        assert!(fee_paid > plain_paid);
        assert!(eth_usdc().with_fee_bps(10_000).is_err());
    }
}
