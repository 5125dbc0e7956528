//! Configuration for the CoinGecko feed

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Whole-request timeout
    pub timeout: Duration,

    /// Demo/pro API key sent as `x-cg-demo-api-key`
    pub api_key: Option<String>,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout: Duration::from_secs(10),
            api_key: None,
        }
    }
}

impl From<&config::PriceFeedConfig> for CoinGeckoConfig {
    fn from(feed: &config::PriceFeedConfig) -> Self {
        let api_key = feed
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());

        Self {
            base_url: feed.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(feed.timeout_ms),
            api_key,
        }
    }
}
