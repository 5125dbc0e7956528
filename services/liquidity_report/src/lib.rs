//! Liquidity report rendering
//!
//! Turns refreshed pools and a loaded price oracle into the per-pool
//! reserve, fiat value and depth lines printed by `liquidity-report`.

pub mod buy;
pub mod report;

pub use buy::{BuyQuote, BuyRequest};
pub use report::{PoolReport, SideReport, TotalRow, TotalsReport};
