//! Named collection of pools keyed by unordered pair

use crate::error::{AmmError, Result};
use crate::pool::Pool;
use crate::pool_traits::BalanceReader;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use types::{PairId, TokenRegistry, U256};

/// Pools of one AMM, at most one per unordered symbol pair
#[derive(Debug, Clone)]
pub struct AmmRegistry {
    name: String,
    registry: Arc<TokenRegistry>,
    pools: BTreeMap<PairId, Pool>,
    fee_bps: u32,
}

impl AmmRegistry {
    pub fn new(name: impl Into<String>, registry: Arc<TokenRegistry>) -> Self {
        Self {
            name: name.into(),
            registry,
            pools: BTreeMap::new(),
            fee_bps: 0,
        }
    }

    /// Fee applied to every pool added afterwards
    pub fn with_fee_bps(mut self, fee_bps: u32) -> Result<Self> {
        if fee_bps >= crate::v2_math::BPS_DENOMINATOR {
            return Err(AmmError::InvalidFee { fee_bps });
        }
        self.fee_bps = fee_bps;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token_registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    /// Canonical key for two symbols in either order, aliases normalized
    pub fn pair_key(&self, symbol_a: &str, symbol_b: &str) -> PairId {
        PairId::new(
            self.registry.normalize(symbol_a),
            self.registry.normalize(symbol_b),
        )
    }

    /// Register a pool for a new pair
    ///
    /// A second pool for a pair that is already present is rejected with
    /// `DuplicatePool`; the first registration stays in place.
    pub fn add_pool(
        &mut self,
        symbol_a: &str,
        symbol_b: &str,
        address: impl Into<String>,
    ) -> Result<&Pool> {
        let pool = Pool::new(self.registry.clone(), symbol_a, symbol_b, address)?
            .with_fee_bps(self.fee_bps)?;

        if let Some(existing) = self.pools.get(pool.id()) {
            return Err(AmmError::DuplicatePool {
                pair: pool.id().clone(),
                existing_address: existing.address().to_string(),
            });
        }

        let id = pool.id().clone();
        Ok(&*self.pools.entry(id).or_insert(pool))
    }

    pub fn get_pool(&self, symbol_a: &str, symbol_b: &str) -> Result<&Pool> {
        let pair = self.pair_key(symbol_a, symbol_b);
        self.pools
            .get(&pair)
            .ok_or(AmmError::PoolNotFound { pair })
    }

    pub fn get_pool_mut(&mut self, symbol_a: &str, symbol_b: &str) -> Result<&mut Pool> {
        let pair = self.pair_key(symbol_a, symbol_b);
        self.pools
            .get_mut(&pair)
            .ok_or(AmmError::PoolNotFound { pair })
    }

    /// Pools in pair-id order
    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Refresh every pool, all-or-nothing across the registry
    ///
    /// Balances for all pools are fetched concurrently without touching any
    /// pool. Only when every fetch and conversion succeeded are the new
    /// reserves written; otherwise the first error is returned and every
    /// pool keeps its previous state.
    pub async fn refresh_all(&mut self, reader: &dyn BalanceReader) -> Result<()> {
        let fetches = self.pools.values().map(|pool| async move {
            let balances = pool.fetch_balances(reader).await?;
            let converted = pool.convert_balances(balances)?;
            Ok::<_, AmmError>((pool.id().clone(), balances, converted))
        });

        let updates = match try_join_all(fetches).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(amm = %self.name, error = %e, "Pool refresh failed, keeping previous reserves");
                return Err(e);
            }
        };

        for (pair, balances, converted) in updates {
            if let Some(pool) = self.pools.get_mut(&pair) {
                pool.commit_balances(balances, converted);
            }
        }

        info!(amm = %self.name, pools = self.pools.len(), "Refreshed all pool balances");
        Ok(())
    }

    /// Raw balance of `symbol` summed over every loaded pool holding it
    pub fn total_balance(&self, symbol: &str) -> Result<U256> {
        let canonical = self.registry.resolve(symbol)?.symbol.as_str();

        let mut total = U256::zero();
        for pool in self.pools.values() {
            let Ok(token) = pool.token(canonical) else {
                continue;
            };
            if let Some(balance) = token.balance_base() {
                total = total.checked_add(balance).ok_or_else(|| {
                    AmmError::ArithmeticOverflow(format!("total {canonical} balance"))
                })?;
            }
        }
        Ok(total)
    }
}
