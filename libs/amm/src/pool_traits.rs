//! Collaborator interfaces the pool model reads live data through

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use types::U256;

/// Reads raw token balances held by a pool contract
///
/// Implementations own transport, retries and timeouts; a returned error is
/// final for the current refresh.
#[async_trait]
pub trait BalanceReader: Send + Sync {
    /// Raw balance of `token_address` held by `holder_address`
    async fn balance_of(&self, token_address: &str, holder_address: &str) -> anyhow::Result<U256>;
}

/// Fetches spot prices in one batched request
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Map of provider id → price in `fiat`
    ///
    /// Ids missing from the response are simply absent from the map; the
    /// oracle decides whether that is fatal.
    async fn fetch_prices(
        &self,
        ids: &[String],
        fiat: &str,
    ) -> anyhow::Result<HashMap<String, Decimal>>;
}
