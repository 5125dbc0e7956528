//! Configuration for the Starknet balance reader

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarknetReaderConfig {
    /// Primary RPC endpoint
    pub primary_rpc: String,

    /// Fallback RPC endpoints, tried in order
    pub fallback_rpcs: Vec<String>,

    /// Timeout for a single `starknet_call` in milliseconds
    pub rpc_timeout_ms: u64,

    /// Retries per endpoint after the first attempt
    pub max_retries: u32,

    /// Delay before retry `n` is `n * retry_backoff_ms`
    pub retry_backoff_ms: u64,

    /// Block the balances are read at
    pub block_id: String,
}

impl Default for StarknetReaderConfig {
    fn default() -> Self {
        Self {
            primary_rpc: "https://starknet-mainnet.public.blastapi.io".to_string(),
            fallback_rpcs: vec!["https://free-rpc.nethermind.io/mainnet-juno/v0_7".to_string()],
            rpc_timeout_ms: 10000,
            max_retries: 3,
            retry_backoff_ms: 500,
            block_id: "latest".to_string(),
        }
    }
}

impl From<&config::RpcConfig> for StarknetReaderConfig {
    fn from(rpc: &config::RpcConfig) -> Self {
        Self {
            primary_rpc: rpc.primary_url.clone(),
            fallback_rpcs: rpc.fallback_urls.clone(),
            rpc_timeout_ms: rpc.timeout_ms,
            max_retries: rpc.max_retries,
            retry_backoff_ms: rpc.retry_backoff_ms,
            ..Self::default()
        }
    }
}
