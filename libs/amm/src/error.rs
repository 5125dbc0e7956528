//! Error types for pool, registry and oracle operations

use rust_decimal::Decimal;
use thiserror::Error;
use types::{PairId, TokenError, U256};

/// Result type alias for AMM operations
pub type Result<T> = std::result::Result<T, AmmError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmmError {
    /// Symbol absent from the token registry or from the loaded price map
    #[error("Unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },

    /// Symbol is not one of the pool's two tokens
    #[error("Token {symbol} is not part of pool {pool}")]
    UnknownToken { symbol: String, pool: PairId },

    #[error("Pool not found: {pair}")]
    PoolNotFound { pair: PairId },

    #[error("Pool {pair} is already registered at {existing_address}")]
    DuplicatePool {
        pair: PairId,
        existing_address: String,
    },

    #[error("Pool needs two distinct tokens, got {symbol} twice")]
    IdenticalTokens { symbol: String },

    /// Buy amount would drain the reserve
    #[error("Insufficient liquidity for {symbol}: requested {requested}, reserve {available}")]
    InsufficientLiquidity {
        symbol: String,
        requested: U256,
        available: U256,
    },

    /// Reserves read before the first successful refresh
    #[error("Balance of {symbol} in pool {pool} has not been loaded")]
    BalanceNotLoaded { symbol: String, pool: PairId },

    #[error("Failed to fetch {token} balance of pool {pool}: {reason}")]
    BalanceFetch {
        pool: PairId,
        token: String,
        reason: String,
    },

    #[error("Failed getting prices: {reason}")]
    PriceFetch { reason: String },

    #[error("Fee of {fee_bps} bps must be below 10000")]
    InvalidFee { fee_bps: u32 },

    #[error("Price impact threshold {threshold} must lie in (0, 1)")]
    InvalidThreshold { threshold: Decimal },

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error(transparent)]
    Token(TokenError),
}

impl From<TokenError> for AmmError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::UnknownSymbol { symbol } => AmmError::UnknownSymbol { symbol },
            other => AmmError::Token(other),
        }
    }
}
