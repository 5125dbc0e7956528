//! Order-independent identifier for a two-token pool
//!
//! A pool holding ETH and USDC is the same pool whichever side the caller
//! names first, so the id is built from the two symbols sorted
//! lexicographically and joined with [`PairId::SEPARATOR`].
//!
//! ```rust
//! use types::PairId;
//!
//! assert_eq!(PairId::new("USDC", "ETH"), PairId::new("ETH", "USDC"));
//! assert_eq!(PairId::new("USDC", "ETH").as_str(), "ETH/USDC");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical unordered-pair key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(String);

impl PairId {
    pub const SEPARATOR: char = '/';

    /// Build the id for two symbols in either order
    ///
    /// Symbols are used as given; callers that accept aliases normalize
    /// through the registry first.
    pub fn new(symbol_a: &str, symbol_b: &str) -> Self {
        let (first, second) = if symbol_a <= symbol_b {
            (symbol_a, symbol_b)
        } else {
            (symbol_b, symbol_a)
        };
        Self(format!("{first}{}{second}", Self::SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two symbols in canonical (sorted) order
    pub fn symbols(&self) -> (&str, &str) {
        self.0
            .split_once(Self::SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PairId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
