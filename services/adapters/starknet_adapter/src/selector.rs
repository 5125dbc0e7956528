//! Entry-point selectors and felt decoding

use crate::error::{Result, StarknetError};
use serde_json::Value;
use sha3::{Digest, Keccak256};
use types::{precision, U256};

/// Keccak-256 truncated to the 250 bits a felt selector holds
pub fn starknet_keccak(data: &[u8]) -> U256 {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Keccak256::digest(data));
    digest[0] &= 0x03;
    U256::from_big_endian(&digest)
}

/// `0x`-prefixed selector of the ERC-20 `balanceOf` entry point
pub fn balance_of_selector() -> String {
    format!("{:#x}", starknet_keccak(b"balanceOf"))
}

/// Combine a `[low, high]` pair of 128-bit felts into one u256
pub fn decode_u256(felts: &[Value]) -> Result<U256> {
    let [low, high] = felts else {
        return Err(StarknetError::MalformedResult(format!(
            "expected [low, high], got {} felts",
            felts.len()
        )));
    };

    let low = felt(low)?;
    let high = felt(high)?;
    if low.bits() > 128 || high.bits() > 128 {
        return Err(StarknetError::MalformedResult(format!(
            "u256 limb wider than 128 bits: low={low:#x} high={high:#x}"
        )));
    }
    Ok((high << 128) | low)
}

fn felt(value: &Value) -> Result<U256> {
    let text = value
        .as_str()
        .ok_or_else(|| StarknetError::MalformedResult(format!("felt is not a string: {value}")))?;
    precision::parse_raw(text).map_err(|e| StarknetError::MalformedResult(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_balance_of_selector() {
        assert_eq!(
            balance_of_selector(),
            "0x2e4263afad30923c891518314c3c95dbe830a16874e8abc5777a9a20b54c76e"
        );
    }

    #[test]
    fn test_selector_fits_250_bits() {
        for name in ["balanceOf", "transfer", "get_reserves", "decimals"] {
            assert!(starknet_keccak(name.as_bytes()).bits() <= 250);
        }
    }

    #[test]
    fn test_decode_low_only() {
        let felts = vec![json!("0xde0b6b3a7640000"), json!("0x0")];
        assert_eq!(
            decode_u256(&felts).unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_decode_high_limb() {
        let felts = vec![json!("0x1"), json!("0x2")];
        let expected = (U256::from(2) << 128) + U256::one();
        assert_eq!(decode_u256(&felts).unwrap(), expected);
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        assert!(decode_u256(&[json!("0x1")]).is_err());
        assert!(decode_u256(&[json!(1), json!("0x0")]).is_err());
        assert!(decode_u256(&[json!("0xzz"), json!("0x0")]).is_err());

        let wide = format!("0x1{}", "0".repeat(32));
        assert!(decode_u256(&[json!(wide), json!("0x0")]).is_err());
    }
}
