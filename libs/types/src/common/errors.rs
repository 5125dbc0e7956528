//! Error types for token lookup and precision conversion
//!
//! Lookup failures carry the symbol that was asked for so a caller several
//! layers up can still tell which entry of the token table is missing.

use thiserror::Error;

/// Result type alias for token registry and precision operations
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors raised by the token registry and raw/decimal conversion
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Symbol is neither a canonical registry key nor a known alias
    #[error("Unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },

    /// Same canonical symbol registered twice
    #[error("Symbol {symbol} is already registered")]
    DuplicateSymbol { symbol: String },

    /// Alias points at a symbol missing from the token table
    #[error("Alias {alias} points at unknown symbol {target}")]
    DanglingAlias { alias: String, target: String },

    /// Alias already names a token or a different alias target
    #[error("Alias {alias} conflicts with existing entry {existing}")]
    AliasConflict { alias: String, existing: String },

    /// Decimal precision outside what `Decimal` can scale by
    #[error("Token {symbol} has {decimals} decimals, maximum supported is {max}")]
    InvalidDecimals { symbol: String, decimals: u8, max: u8 },

    /// Value does not fit the target representation
    #[error("Precision overflow: {0}")]
    PrecisionOverflow(String),

    /// Decimal amount is negative or finer than the token's smallest unit
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: String },
}

impl TokenError {
    /// Convenience constructor used by every lookup path
    pub fn unknown(symbol: impl Into<String>) -> Self {
        TokenError::UnknownSymbol {
            symbol: symbol.into(),
        }
    }
}
