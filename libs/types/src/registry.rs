//! Static token registry: symbol → (address, decimals)
//!
//! Built once at startup from configuration and shared read-only (behind
//! `Arc`) by every pool and by the price oracle. Holds the single alias
//! table, so `wBTC` on a pool and `wBTC` in a price lookup resolve to the
//! same canonical entry.

use crate::common::errors::{Result, TokenError};
use crate::precision::check_decimals;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One entry of the token table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Canonical symbol, the registry key
    pub symbol: String,
    /// Opaque on-chain token contract identifier
    pub address: String,
    /// Smallest-unit digits per whole token
    pub decimals: u8,
    /// Identifier of this token at the price-feed provider
    pub price_id: Option<String>,
    /// Symbol shown in reports when it differs from the canonical key
    pub display: Option<String>,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, address: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address: address.into(),
            decimals,
            price_id: None,
            display: None,
        }
    }

    pub fn with_price_id(mut self, price_id: impl Into<String>) -> Self {
        self.price_id = Some(price_id.into());
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Symbol for human-facing output
    pub fn display_symbol(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.symbol)
    }
}

/// Immutable symbol lookup table with alias normalization
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: BTreeMap<String, TokenInfo>,
    aliases: HashMap<String, String>,
}

impl TokenRegistry {
    pub fn builder() -> TokenRegistryBuilder {
        TokenRegistryBuilder::default()
    }

    /// Map an alias or a differently cased symbol onto its canonical symbol
    ///
    /// Exact matches win over case-insensitive ones, so `wBTC` and `WBTC`
    /// may both be configured. Unknown strings are returned unchanged and
    /// then fail in [`resolve`](Self::resolve).
    pub fn normalize<'a>(&'a self, symbol: &'a str) -> &'a str {
        if self.tokens.contains_key(symbol) {
            return symbol;
        }
        if let Some(canonical) = self.aliases.get(symbol) {
            return canonical.as_str();
        }
        if let Some(canonical) = self.tokens.keys().find(|s| s.eq_ignore_ascii_case(symbol)) {
            return canonical.as_str();
        }
        self.aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(symbol))
            .map(|(_, canonical)| canonical.as_str())
            .unwrap_or(symbol)
    }

    /// Look up a token by canonical symbol or alias
    pub fn resolve(&self, symbol: &str) -> Result<&TokenInfo> {
        self.tokens
            .get(self.normalize(symbol))
            .ok_or_else(|| TokenError::unknown(symbol))
    }

    pub fn decimals(&self, symbol: &str) -> Result<u8> {
        self.resolve(symbol).map(|info| info.decimals)
    }

    pub fn address(&self, symbol: &str) -> Result<&str> {
        self.resolve(symbol).map(|info| info.address.as_str())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.tokens.contains_key(self.normalize(symbol))
    }

    /// All entries in canonical symbol order
    pub fn tokens(&self) -> impl Iterator<Item = &TokenInfo> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `(price_id, canonical symbol)` for every token that has a price id
    pub fn price_ids(&self) -> Vec<(String, String)> {
        self.tokens
            .values()
            .filter_map(|info| {
                info.price_id
                    .as_ref()
                    .map(|id| (id.clone(), info.symbol.clone()))
            })
            .collect()
    }
}

/// Collects tokens and aliases, validating them as a whole in [`build`](Self::build)
#[derive(Debug, Default)]
pub struct TokenRegistryBuilder {
    tokens: Vec<TokenInfo>,
    aliases: Vec<(String, String)>,
}

impl TokenRegistryBuilder {
    pub fn token(mut self, info: TokenInfo) -> Self {
        self.tokens.push(info);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.push((alias.into(), canonical.into()));
        self
    }

    pub fn build(self) -> Result<TokenRegistry> {
        let mut tokens = BTreeMap::new();
        for info in self.tokens {
            check_decimals(&info.symbol, info.decimals)?;
            if tokens.contains_key(&info.symbol) {
                return Err(TokenError::DuplicateSymbol {
                    symbol: info.symbol,
                });
            }
            tokens.insert(info.symbol.clone(), info);
        }

        let mut aliases: HashMap<String, String> = HashMap::new();
        for (alias, target) in self.aliases {
            if !tokens.contains_key(&target) {
                return Err(TokenError::DanglingAlias { alias, target });
            }
            if tokens.contains_key(&alias) {
                return Err(TokenError::AliasConflict {
                    existing: alias.clone(),
                    alias,
                });
            }
            match aliases.get(&alias) {
                Some(existing) if existing != &target => {
                    return Err(TokenError::AliasConflict {
                        alias,
                        existing: existing.clone(),
                    });
                }
                _ => {
                    aliases.insert(alias, target);
                }
            }
        }
        // A token's display form is an implicit alias unless configured otherwise
        for info in tokens.values() {
            if let Some(display) = &info.display {
                if display != &info.symbol {
                    aliases
                        .entry(display.clone())
                        .or_insert_with(|| info.symbol.clone());
                }
            }
        }

        debug!(
            tokens = tokens.len(),
            aliases = aliases.len(),
            "Token registry built"
        );

        Ok(TokenRegistry { tokens, aliases })
    }
}
