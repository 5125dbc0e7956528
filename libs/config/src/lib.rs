//! # Ammscope Configuration
//!
//! Loads the token table, AMM pool lists, price feed and RPC settings used
//! by every Ammscope service from a single TOML file.
//!
//! ## Sources
//!
//! Later sources override earlier ones:
//!
//! 1. the base file (`config/jediswap.toml` by default)
//! 2. `environments/<env>.toml` next to the base file, when an environment is named
//! 3. `AMMSCOPE_`-prefixed environment variables, `__` separating nesting levels
//!    (`AMMSCOPE_RPC__PRIMARY_URL`, `AMMSCOPE_GLOBAL__FIAT`)
//!
//! ## Usage
//!
//! ```no_run
//! use config::load_config;
//!
//! let config = load_config(None).unwrap();
//! let registry = config.token_registry().unwrap();
//! for amm in config.build_amms(registry.into()).unwrap() {
//!     println!("{}: {} pools", amm.name(), amm.len());
//! }
//! ```

pub mod app_config;

pub use app_config::{
    load_config, AmmConfig, AppConfig, GlobalConfig, PoolConfig, PriceFeedConfig, RpcConfig,
    TokenConfig, DEFAULT_CONFIG_PATH,
};
