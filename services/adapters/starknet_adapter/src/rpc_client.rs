//! RPC client for reading pool balances
//!
//! Handles all communication with Starknet nodes for reserve reads.
//! Includes per-call timeouts, retry with linear backoff, and fallback endpoints.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use types::U256;
use web3::transports::Http;
use web3::Transport;

use crate::config::StarknetReaderConfig;
use crate::error::{Result, StarknetError};
use crate::selector::{balance_of_selector, decode_u256};

pub struct StarknetBalanceReader {
    config: StarknetReaderConfig,
    endpoints: Vec<(String, Http)>,
    selector: String,
}

impl StarknetBalanceReader {
    /// Create new reader with configured endpoints
    pub fn new(config: StarknetReaderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| StarknetError::InvalidEndpoint {
                url: config.primary_rpc.clone(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        let mut endpoints = Vec::new();

        // Primary RPC must be usable
        let primary = Self::transport(&client, &config.primary_rpc)?;
        endpoints.push((config.primary_rpc.clone(), primary));

        // Fallback RPCs
        for rpc_url in &config.fallback_rpcs {
            match Self::transport(&client, rpc_url) {
                Ok(transport) => endpoints.push((rpc_url.clone(), transport)),
                Err(e) => warn!("Skipping fallback RPC: {}", e),
            }
        }

        Ok(Self {
            config,
            endpoints,
            selector: balance_of_selector(),
        })
    }

    fn transport(client: &reqwest::Client, url: &str) -> Result<Http> {
        let parsed: reqwest::Url = url.parse().map_err(|e| StarknetError::InvalidEndpoint {
            url: url.to_string(),
            reason: format!("{e}"),
        })?;
        Ok(Http::with_client(client.clone(), parsed))
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|(url, _)| url.as_str())
    }

    /// Raw balance of `token_address` held by `holder_address`
    pub async fn read_balance(&self, token_address: &str, holder_address: &str) -> Result<U256> {
        if self.endpoints.is_empty() {
            return Err(StarknetError::NoEndpoints);
        }
        let params = self.call_params(token_address, holder_address);

        let mut attempts = 0;
        let mut last_error = None;

        // Try each RPC endpoint until one succeeds
        for (idx, (endpoint, transport)) in self.endpoints.iter().enumerate() {
            for retry in 0..=self.config.max_retries {
                if retry > 0 {
                    let backoff = self.config.retry_backoff_ms * u64::from(retry);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                attempts += 1;

                match self.call(endpoint, transport, params.clone()).await {
                    Ok(balance) => {
                        debug!(
                            token = token_address,
                            holder = holder_address,
                            %balance,
                            "Read balance via RPC endpoint {}",
                            idx
                        );
                        return Ok(balance);
                    }
                    Err(e) => {
                        warn!("RPC endpoint {} attempt {} failed: {}", idx, retry + 1, e);
                        let retryable = e.is_retryable();
                        last_error = Some(e);
                        if !retryable {
                            break;
                        }
                    }
                }
            }
        }

        Err(StarknetError::Exhausted {
            attempts,
            endpoints: self.endpoints.len(),
            last: Box::new(last_error.unwrap_or(StarknetError::NoEndpoints)),
        })
    }

    fn call_params(&self, token_address: &str, holder_address: &str) -> Vec<Value> {
        vec![
            json!({
                "contract_address": token_address,
                "entry_point_selector": self.selector,
                "calldata": [holder_address],
            }),
            json!(self.config.block_id),
        ]
    }

    async fn call(&self, endpoint: &str, transport: &Http, params: Vec<Value>) -> Result<U256> {
        let timeout_ms = self.config.rpc_timeout_ms;
        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            transport.execute("starknet_call", params),
        )
        .await
        .map_err(|_| StarknetError::Timeout {
            endpoint: endpoint.to_string(),
            timeout_ms,
        })?
        .map_err(|source| StarknetError::Rpc {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let felts = result.as_array().ok_or_else(|| {
            StarknetError::MalformedResult(format!("expected felt array, got {result}"))
        })?;
        decode_u256(felts)
    }
}

#[async_trait]
impl amm::BalanceReader for StarknetBalanceReader {
    async fn balance_of(&self, token_address: &str, holder_address: &str) -> anyhow::Result<U256> {
        Ok(self.read_balance(token_address, holder_address).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_params_shape() {
        let reader = StarknetBalanceReader::new(StarknetReaderConfig::default()).unwrap();
        let params = reader.call_params("0x049d", "0x04d0");

        assert_eq!(params.len(), 2);
        assert_eq!(params[0]["contract_address"], "0x049d");
        assert_eq!(params[0]["entry_point_selector"], balance_of_selector());
        assert_eq!(params[0]["calldata"], json!(["0x04d0"]));
        assert_eq!(params[1], "latest");
    }

    #[test]
    fn test_invalid_primary_rejected() {
        let config = StarknetReaderConfig {
            primary_rpc: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            StarknetBalanceReader::new(config),
            Err(StarknetError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_invalid_fallback_skipped() {
        let config = StarknetReaderConfig {
            fallback_rpcs: vec!["::bad::".to_string(), "http://127.0.0.1:5050".to_string()],
            ..Default::default()
        };
        let reader = StarknetBalanceReader::new(config).unwrap();
        assert_eq!(reader.endpoints().count(), 2);
    }
}
