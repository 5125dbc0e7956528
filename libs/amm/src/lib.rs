//! # Ammscope AMM Library - Constant-Product Pool Model
//!
//! ## Purpose
//!
//! Models decentralized-exchange pools that follow the x*y=k invariant and
//! turns their on-chain reserves into fiat figures. Provides exact swap
//! simulation on raw reserves, a closed-form liquidity-depth estimate and
//! fiat conversion against externally fetched spot prices.
//!
//! ## Integration Points
//!
//! - **Input Sources**: raw balances from a [`BalanceReader`], spot prices from a [`PriceFeed`]
//! - **Static Data**: [`types::TokenRegistry`] for addresses, decimals and symbol aliases
//! - **Output Destinations**: liquidity reports and trade previews
//! - **Precision**: raw `U256` integers for reserves, `Decimal` for converted amounts
//!
//! ## Architecture Role
//!
//! ```text
//! TokenRegistry ──┬──> Pool (x2 Token) ──> AmmRegistry ──refresh_all──> BalanceReader
//!                 └──> PriceOracle ──────────────────────load────────> PriceFeed
//! ```
//!
//! Pools and prices share no mutable state. Pool mutation goes through
//! `&mut`, so a simulation can never observe a pool in the middle of a
//! refresh.

pub mod error;
pub mod oracle;
pub mod pool;
pub mod pool_traits;
pub mod registry;
pub mod v2_math;

pub use error::{AmmError, Result};
pub use oracle::{format_fiat, PriceOracle};
pub use pool::{Pool, PoolSnapshot, SwapPreview, Token};
pub use pool_traits::{BalanceReader, PriceFeed};
pub use registry::AmmRegistry;
pub use v2_math::{ExactOutputQuote, V2Math, DEFAULT_PRICE_IMPACT_THRESHOLD};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
pub use types::{PairId, TokenInfo, TokenRegistry, U256};
