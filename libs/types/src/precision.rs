//! Precision Handling for On-Chain Token Amounts
//!
//! Converts between raw on-chain integers (the token's smallest unit) and
//! human decimal amounts without passing through floating point.
//!
//! ## Precision by Token
//!
//! - **ETH / DAI**: 18 decimal places (`1 ETH = 1_000_000_000_000_000_000 wei`)
//! - **USDC / USDT**: 6 decimal places (`1 USDC = 1_000_000 units`)
//! - **WBTC**: 8 decimal places (`1 WBTC = 100_000_000 satoshis`)
//!
//! ## Critical Rules
//!
//! 1. **NO FLOATING POINT**: never use f32/f64 for balances or prices
//! 2. **Exact Scaling**: `raw_to_decimal` is the exact value of `raw / 10^decimals`
//!    while it fits `Decimal`'s 28 significant digits; past that the fraction
//!    is rounded to the nearest representable value
//! 3. **No Silent Truncation**: `decimal_to_raw` refuses amounts finer than one raw unit

use crate::common::errors::{Result, TokenError};
use rust_decimal::Decimal;
use web3::types::U256;

/// Largest scale a `Decimal` can carry
pub const MAX_DECIMALS: u8 = 28;

/// Bits available in a `Decimal` mantissa
const MANTISSA_BITS: usize = 96;

/// `10^decimals` as a raw integer
pub fn pow10(decimals: u8) -> U256 {
    U256::exp10(decimals as usize)
}

/// Convert a raw on-chain balance into its decimal amount
///
/// The integer and fractional parts are split in `U256` so that balances far
/// above the `Decimal` mantissa in raw units (an 18-decimal token holding a
/// few thousand whole units already exceeds it) still convert. The result is
/// exact up to 28 significant digits; larger whole parts keep every integer
/// digit and lose trailing fraction digits.
pub fn raw_to_decimal(raw: U256, decimals: u8) -> Result<Decimal> {
    check_decimals("<raw>", decimals)?;

    let (whole, fraction) = raw.div_mod(pow10(decimals));
    if whole.bits() > MANTISSA_BITS {
        return Err(TokenError::PrecisionOverflow(format!(
            "raw amount {raw} with {decimals} decimals exceeds decimal range"
        )));
    }

    let whole = Decimal::try_from_i128_with_scale(whole.low_u128() as i128, 0)
        .map_err(|e| TokenError::PrecisionOverflow(e.to_string()))?;
    let fraction = Decimal::try_from_i128_with_scale(fraction.low_u128() as i128, decimals as u32)
        .map_err(|e| TokenError::PrecisionOverflow(e.to_string()))?;

    whole.checked_add(fraction).ok_or_else(|| {
        TokenError::PrecisionOverflow(format!("raw amount {raw} exceeds decimal range"))
    })
}

/// Convert a decimal amount of whole tokens into raw units
pub fn decimal_to_raw(amount: Decimal, decimals: u8) -> Result<U256> {
    check_decimals("<amount>", decimals)?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(TokenError::InvalidAmount {
            amount: amount.to_string(),
            reason: "amount must not be negative".to_string(),
        });
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > decimals as u32 {
        return Err(TokenError::InvalidAmount {
            amount: amount.to_string(),
            reason: format!("more than {decimals} fractional digits"),
        });
    }

    let mantissa = U256::from(normalized.mantissa().unsigned_abs());
    mantissa
        .checked_mul(U256::exp10((decimals as u32 - scale) as usize))
        .ok_or_else(|| TokenError::PrecisionOverflow(format!("{amount} overflows raw units")))
}

/// Parse a raw balance printed in decimal or `0x`-prefixed hex
pub fn parse_raw(value: &str) -> Result<U256> {
    let trimmed = value.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) if hex.is_empty() => Ok(U256::zero()),
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(trimmed).map_err(|e| format!("{e:?}")),
    };
    parsed.map_err(|reason| TokenError::InvalidAmount {
        amount: value.to_string(),
        reason,
    })
}

pub(crate) fn check_decimals(symbol: &str, decimals: u8) -> Result<()> {
    if decimals > MAX_DECIMALS {
        return Err(TokenError::InvalidDecimals {
            symbol: symbol.to_string(),
            decimals,
            max: MAX_DECIMALS,
        });
    }
    Ok(())
}
