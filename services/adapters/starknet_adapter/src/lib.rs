//! Starknet Balance Adapter
//!
//! Reads ERC-20 balances held by pool contracts over Starknet JSON-RPC.
//! This adapter is the only place the pool model touches the network for
//! reserves; pools see it through [`amm::BalanceReader`].
//!
//! Features:
//! - `starknet_call` against `balanceOf` with a `[low, high]` u256 result
//! - Per-call timeout, linear retry backoff and fallback endpoints

pub mod config;
pub mod error;
pub mod rpc_client;
pub mod selector;

pub use crate::config::StarknetReaderConfig;
pub use error::{Result, StarknetError};
pub use rpc_client::StarknetBalanceReader;
pub use selector::{balance_of_selector, decode_u256, starknet_keccak};
