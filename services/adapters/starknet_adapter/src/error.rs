//! Error types for Starknet RPC reads

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StarknetError>;

#[derive(Debug, Error)]
pub enum StarknetError {
    #[error("Invalid RPC endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("No valid RPC endpoints configured")]
    NoEndpoints,

    #[error("starknet_call to {endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("RPC error from {endpoint}: {source}")]
    Rpc {
        endpoint: String,
        #[source]
        source: web3::Error,
    },

    #[error("Malformed call result: {0}")]
    MalformedResult(String),

    #[error("All {attempts} attempts across {endpoints} endpoints failed, last error: {last}")]
    Exhausted {
        attempts: u32,
        endpoints: usize,
        last: Box<StarknetError>,
    },
}

impl StarknetError {
    /// Timeouts and transport failures; a malformed result moves on to the next endpoint
    pub fn is_retryable(&self) -> bool {
        matches!(self, StarknetError::Timeout { .. } | StarknetError::Rpc { .. })
    }
}
