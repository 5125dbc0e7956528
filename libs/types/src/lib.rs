//! # Ammscope Types
//!
//! Shared vocabulary for the Ammscope workspace: which tokens exist, how their
//! raw on-chain integers map to human decimal amounts, and how a pair of
//! tokens is named.
//!
//! ## Design Philosophy
//!
//! - **No Floating Point**: raw balances are `U256`, human amounts are `Decimal`
//! - **Exact Scaling**: `raw / 10^decimals` is computed without rounding
//! - **Immutable Registry**: the token table is built once and shared behind `Arc`
//! - **One Normalization Rule**: aliases (`wBTC`, `zETH`, ...) resolve to a single
//!   canonical symbol for every consumer
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{TokenRegistry, TokenInfo, precision};
//!
//! let registry = TokenRegistry::builder()
//!     .token(TokenInfo::new("ETH", "0x049d", 18).with_price_id("ethereum"))
//!     .alias("zETH", "ETH")
//!     .build()
//!     .unwrap();
//!
//! let eth = registry.resolve("zETH").unwrap();
//! let amount = precision::raw_to_decimal(1_500_000_000_000_000_000u64.into(), eth.decimals).unwrap();
//! assert_eq!(amount.to_string(), "1.500000000000000000");
//! ```

pub mod common;
pub mod precision;
pub mod registry;

pub use common::errors::{Result, TokenError};
pub use common::identifiers::PairId;
pub use registry::{TokenInfo, TokenRegistry, TokenRegistryBuilder};

/// Raw on-chain integer amount in a token's smallest unit
pub use web3::types::U256;

pub use rust_decimal::Decimal;
