//! Application Configuration Module
//!
//! Token table, AMM pool lists and collaborator settings, loaded from TOML
//! with environment-specific overrides.

use amm::AmmRegistry;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::{TokenInfo, TokenRegistry};

/// Base file used when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/jediswap.toml";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Token table
    pub tokens: Vec<TokenConfig>,

    /// AMMs and their pools
    #[serde(default)]
    pub amms: Vec<AmmConfig>,

    /// Spot price provider
    #[serde(default)]
    pub price_feed: PriceFeedConfig,

    /// Chain node endpoints
    #[serde(default)]
    pub rpc: RpcConfig,
}

/// Global configuration settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
    /// Fiat currency prices are quoted in, provider spelling (`usd`)
    pub fiat: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            fiat: "usd".to_string(),
        }
    }
}

/// One row of the token table
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
    /// Price provider id (`ethereum`, `usd-coin`)
    pub price_id: Option<String>,
    /// Display spelling when it differs from `symbol` (`wBTC`)
    pub display: Option<String>,
    /// Alternative spellings resolving to this token (`zETH`)
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AmmConfig {
    pub name: String,
    #[serde(default)]
    pub fee_bps: u32,
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PoolConfig {
    pub token_a: String,
    pub token_b: String,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PriceFeedConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Name of the environment variable holding an API key, if the plan needs one
    pub api_key_env: Option<String>,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout_ms: 10_000,
            api_key_env: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RpcConfig {
    pub primary_url: String,
    pub fallback_urls: Vec<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://starknet-mainnet.public.blastapi.io".to_string(),
            fallback_urls: Vec::new(),
            timeout_ms: 10_000,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl AppConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        // Environment files live next to the base file
        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{env}.toml"));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (AMMSCOPE_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("AMMSCOPE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        debug!(
            tokens = config.tokens.len(),
            amms = config.amms.len(),
            "Configuration loaded from {:?}",
            base
        );
        Ok(config)
    }

    /// Expand environment variables in endpoint URLs
    pub fn expand_env_vars(&mut self) -> Result<()> {
        self.rpc.primary_url = expand(&self.rpc.primary_url, "RPC URL")?;
        for url in &mut self.rpc.fallback_urls {
            *url = expand(url, "fallback RPC URL")?;
        }
        self.price_feed.base_url = expand(&self.price_feed.base_url, "price feed URL")?;
        Ok(())
    }

    /// Immutable token registry built from the token table
    pub fn token_registry(&self) -> Result<TokenRegistry> {
        let mut builder = TokenRegistry::builder();
        for token in &self.tokens {
            let mut info = TokenInfo::new(&token.symbol, &token.address, token.decimals);
            if let Some(id) = &token.price_id {
                info = info.with_price_id(id);
            }
            if let Some(display) = &token.display {
                info = info.with_display(display);
            }
            builder = builder.token(info);
            for alias in &token.aliases {
                builder = builder.alias(alias, &token.symbol);
            }
        }
        builder.build().context("Invalid token table")
    }

    /// Reject configurations that would only fail once services start
    pub fn validate(&self) -> Result<()> {
        let registry = self.token_registry()?;

        let mut names = HashSet::new();
        for amm in &self.amms {
            if !names.insert(amm.name.as_str()) {
                bail!("AMM {} is configured twice", amm.name);
            }
            if amm.fee_bps >= 10_000 {
                bail!("AMM {} has fee_bps {} (must be below 10000)", amm.name, amm.fee_bps);
            }

            let mut pairs = HashSet::new();
            for pool in &amm.pools {
                for symbol in [&pool.token_a, &pool.token_b] {
                    if !registry.contains(symbol) {
                        bail!(
                            "AMM {} pool {} references unknown token {}",
                            amm.name,
                            pool.address,
                            symbol
                        );
                    }
                }
                let pair = types::PairId::new(
                    registry.normalize(&pool.token_a),
                    registry.normalize(&pool.token_b),
                );
                if !pairs.insert(pair.clone()) {
                    bail!("AMM {} lists pair {} more than once", amm.name, pair);
                }
            }
        }

        if self.rpc.primary_url.is_empty() {
            bail!("rpc.primary_url is empty");
        }
        Ok(())
    }

    pub fn amm(&self, name: &str) -> Option<&AmmConfig> {
        self.amms.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Build every configured AMM with its pools registered
    pub fn build_amms(&self, registry: Arc<TokenRegistry>) -> Result<Vec<AmmRegistry>> {
        self.amms
            .iter()
            .map(|amm| amm.build(registry.clone()))
            .collect()
    }
}

impl AmmConfig {
    pub fn build(&self, registry: Arc<TokenRegistry>) -> Result<AmmRegistry> {
        let mut amm = AmmRegistry::new(&self.name, registry).with_fee_bps(self.fee_bps)?;
        for pool in &self.pools {
            amm.add_pool(&pool.token_a, &pool.token_b, &pool.address)
                .with_context(|| format!("Failed to add pool {} to {}", pool.address, self.name))?;
        }
        info!(amm = %self.name, pools = amm.len(), fee_bps = self.fee_bps, "AMM configured");
        Ok(amm)
    }
}

fn expand(value: &str, what: &str) -> Result<String> {
    let expanded = shellexpand::env(value).with_context(|| format!("Failed to expand {what}"))?;
    Ok(expanded.to_string())
}

/// Load the default configuration, expanded and validated
pub fn load_config(environment: Option<&str>) -> Result<AppConfig> {
    let mut config = AppConfig::load(None, environment)?;
    config.expand_env_vars()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BASE: &str = r#"
[global]
log_level = "debug"

[[tokens]]
symbol = "ETH"
address = "0xeth"
decimals = 18
price_id = "ethereum"
aliases = ["zETH"]

[[tokens]]
symbol = "USDC"
address = "0xusdc"
decimals = 6
price_id = "usd-coin"

[[tokens]]
symbol = "WBTC"
address = "0xwbtc"
decimals = 8
price_id = "bitcoin"
display = "wBTC"

[[amms]]
name = "JediSwap"

[[amms.pools]]
token_a = "ETH"
token_b = "USDC"
address = "0xpool1"

[[amms.pools]]
token_a = "wBTC"
token_b = "ETH"
address = "0xpool2"

[rpc]
primary_url = "https://${AMMSCOPE_TEST_RPC_HOST}/rpc"
fallback_urls = ["https://backup.example/rpc"]
"#;

    fn write_base(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("jediswap.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let path = write_base(dir.path(), BASE);

        let config = AppConfig::load(Some(&path), None).unwrap();

        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.global.fiat, "usd");
        assert_eq!(config.tokens.len(), 3);
        assert_eq!(config.tokens[0].aliases, vec!["zETH"]);
        assert_eq!(config.amms[0].fee_bps, 0);
        assert_eq!(config.amms[0].pools.len(), 2);
        assert_eq!(config.price_feed.base_url, "https://api.coingecko.com/api/v3");
        config.validate().unwrap();
    }

    #[test]
    fn test_token_registry_from_table() {
        let dir = tempdir().unwrap();
        let path = write_base(dir.path(), BASE);
        let config = AppConfig::load(Some(&path), None).unwrap();

        let registry = config.token_registry().unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.normalize("zETH"), "ETH");
        assert_eq!(registry.normalize("wBTC"), "WBTC");
        assert_eq!(registry.decimals("USDC").unwrap(), 6);
    }

    #[test]
    fn test_build_amms() {
        let dir = tempdir().unwrap();
        let path = write_base(dir.path(), BASE);
        let config = AppConfig::load(Some(&path), None).unwrap();

        let registry = Arc::new(config.token_registry().unwrap());
        let amms = config.build_amms(registry).unwrap();
        assert_eq!(amms.len(), 1);
        assert_eq!(amms[0].name(), "JediSwap");
        assert_eq!(amms[0].get_pool("ETH", "WBTC").unwrap().address(), "0xpool2");
        assert!(config.amm("jediswap").is_some());
    }

    #[test]
    fn test_environment_override() {
        let dir = tempdir().unwrap();
        let path = write_base(dir.path(), BASE);
        fs::create_dir(dir.path().join("environments")).unwrap();
        fs::write(
            dir.path().join("environments").join("staging.toml"),
            "[global]\nfiat = \"eur\"\n\n[price_feed]\ntimeout_ms = 2500\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path), Some("staging")).unwrap();
        assert_eq!(config.global.fiat, "eur");
        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.price_feed.timeout_ms, 2500);

        // a missing environment file only warns
        let config = AppConfig::load(Some(&path), Some("nowhere")).unwrap();
        assert_eq!(config.price_feed.timeout_ms, 10_000);
    }

    #[test]
    fn test_env_var_expansion() {
        let dir = tempdir().unwrap();
        let path = write_base(dir.path(), BASE);
        std::env::set_var("AMMSCOPE_TEST_RPC_HOST", "node.example");

        let mut config = AppConfig::load(Some(&path), None).unwrap();
        config.expand_env_vars().unwrap();
        assert_eq!(config.rpc.primary_url, "https://node.example/rpc");
        assert_eq!(config.rpc.fallback_urls, vec!["https://backup.example/rpc"]);
    }

    #[test]
    fn test_validate_rejects_unknown_token() {
        let dir = tempdir().unwrap();
        let content = BASE.replace("token_b = \"USDC\"", "token_b = \"DOGE\"");
        let path = write_base(dir.path(), &content);
        let config = AppConfig::load(Some(&path), None).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DOGE"));
    }

    #[test]
    fn test_validate_rejects_duplicate_pair() {
        let dir = tempdir().unwrap();
        let content = BASE.replace(
            "[rpc]",
            "[[amms.pools]]\ntoken_a = \"USDC\"\ntoken_b = \"zETH\"\naddress = \"0xpool3\"\n\n[rpc]",
        );
        let path = write_base(dir.path(), &content);
        let config = AppConfig::load(Some(&path), None).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ETH/USDC"));
        assert!(config.build_amms(Arc::new(config.token_registry().unwrap())).is_err());
    }

    #[test]
    fn test_validate_rejects_conflicting_alias() {
        let dir = tempdir().unwrap();
        let content = BASE.replace("display = \"wBTC\"", "display = \"wBTC\"\naliases = [\"zETH\"]");
        let path = write_base(dir.path(), &content);
        let config = AppConfig::load(Some(&path), None).unwrap();

        assert!(config.token_registry().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_base_file() {
        let dir = tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml")), None).is_err());
    }
}
