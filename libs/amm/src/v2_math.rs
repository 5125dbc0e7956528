//! Constant-product (x*y=k) AMM math with exact calculations
//!
//! Swap simulation runs on raw `U256` reserves: the product of two raw
//! reserves (1e19 wei × 2e10 USDC units) already exceeds what a `Decimal`
//! mantissa can hold, so `k / new_reserve` is evaluated as an exact integer
//! division and rounded half-to-even. Liquidity depth works on converted
//! reserves, which comfortably fit `Decimal`.

use crate::error::{AmmError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use types::U256;

/// Price move after which liquidity is no longer counted as "at price"
pub const DEFAULT_PRICE_IMPACT_THRESHOLD: Decimal = dec!(0.05);

/// Basis-point denominator for fees
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Outcome of buying an exact amount out of a constant-product pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactOutputQuote {
    /// Raw units of the sell token paid into the pool, fee included
    pub amount_in: U256,
    /// Buy-side reserve after the trade
    pub new_reserve_out: U256,
    /// Sell-side reserve after the trade
    pub new_reserve_in: U256,
}

/// Constant-product math functions with zero precision loss
pub struct V2Math;

impl V2Math {
    /// Calculate the input required to take exactly `amount_out` from the pool
    ///
    /// # Arguments
    /// * `amount_out` - Raw units of the buy token leaving the pool
    /// * `reserve_in` - Raw reserve of the token paid in
    /// * `reserve_out` - Raw reserve of the token bought
    /// * `fee_bps` - Fee in basis points charged on the input (0 = pure x*y=k)
    ///
    /// # Returns
    /// Input amount and both resulting reserves. With a zero fee the new
    /// reserves satisfy `new_out * new_in ≈ reserve_out * reserve_in` up to
    /// the final integer rounding.
    pub fn calculate_input_amount(
        symbol: &str,
        amount_out: U256,
        reserve_in: U256,
        reserve_out: U256,
        fee_bps: u32,
    ) -> Result<ExactOutputQuote> {
        if fee_bps >= BPS_DENOMINATOR {
            return Err(AmmError::InvalidFee { fee_bps });
        }
        if amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity {
                symbol: symbol.to_string(),
                requested: amount_out,
                available: reserve_out,
            });
        }

        let k = reserve_out.checked_mul(reserve_in).ok_or_else(|| {
            AmmError::ArithmeticOverflow(format!(
                "constant product of {reserve_out} and {reserve_in}"
            ))
        })?;

        let new_reserve_out = reserve_out - amount_out;
        let balanced_in = div_round_half_even(k, new_reserve_out);
        // k / new_out >= k / out = reserve_in, rounding cannot go below it
        let net_in = balanced_in.saturating_sub(reserve_in);

        let amount_in = if fee_bps == 0 {
            net_in
        } else {
            let grossed = net_in
                .checked_mul(U256::from(BPS_DENOMINATOR))
                .ok_or_else(|| AmmError::ArithmeticOverflow(format!("fee on {net_in}")))?;
            div_round_half_even(grossed, U256::from(BPS_DENOMINATOR - fee_bps))
        };

        let new_reserve_in = reserve_in.checked_add(amount_in).ok_or_else(|| {
            AmmError::ArithmeticOverflow(format!("reserve {reserve_in} plus {amount_in}"))
        })?;

        Ok(ExactOutputQuote {
            amount_in,
            new_reserve_out,
            new_reserve_in,
        })
    }

    /// Estimate liquidity available before the price moves by `threshold`
    ///
    /// With `constant = reserve0 * reserve1` (converted units) and `price`
    /// quoted in the counter token, `sqrt(price * constant)` is the counter
    /// reserve at that price. Moving the price by `threshold` shrinks that
    /// reserve by the factor `sqrt(1 - threshold)`, so the depth is
    /// `sqrt(price * constant) * (1 - sqrt(1 - threshold))`.
    pub fn supply_at_price(
        reserve0: Decimal,
        reserve1: Decimal,
        price: Decimal,
        threshold: Decimal,
    ) -> Result<Decimal> {
        if threshold <= Decimal::ZERO || threshold >= Decimal::ONE {
            return Err(AmmError::InvalidThreshold { threshold });
        }
        if price < Decimal::ZERO {
            return Err(AmmError::ArithmeticOverflow(format!(
                "negative price {price}"
            )));
        }

        let constant = reserve0
            .checked_mul(reserve1)
            .ok_or_else(|| AmmError::ArithmeticOverflow("reserve product".to_string()))?;
        let scaled = price
            .checked_mul(constant)
            .ok_or_else(|| AmmError::ArithmeticOverflow("price times constant".to_string()))?;

        let band = Decimal::ONE - Self::decimal_sqrt(Decimal::ONE - threshold)?;
        Ok(Self::decimal_sqrt(scaled)? * band)
    }

    /// Spot price of the `base` reserve quoted in the `quote` reserve
    pub fn spot_price(base_reserve: Decimal, quote_reserve: Decimal) -> Result<Decimal> {
        quote_reserve.checked_div(base_reserve).ok_or_else(|| {
            AmmError::ArithmeticOverflow(format!(
                "spot price {quote_reserve} / {base_reserve}"
            ))
        })
    }

    /// Calculate square root of a Decimal using Newton's method
    /// Maintains precision for large numbers
    pub fn decimal_sqrt(value: Decimal) -> Result<Decimal> {
        if value < Decimal::ZERO {
            return Err(AmmError::ArithmeticOverflow(format!(
                "square root of negative number {value}"
            )));
        }
        if value.is_zero() {
            return Ok(Decimal::ZERO);
        }

        // Initial guess: the value itself, or 1 for values below one
        let mut x = value.max(Decimal::ONE);
        let epsilon = dec!(0.0000000000000001);

        // Newton's method: x_new = (x + value/x) / 2
        let max_iterations = 200;
        for _ in 0..max_iterations {
            let next_x = (x + value / x) / dec!(2);

            if (next_x - x).abs() < epsilon {
                return Ok(next_x);
            }

            x = next_x;
        }

        // Return best approximation if not fully converged
        Ok(x)
    }
}

/// Integer division rounded to nearest, ties to even
pub fn div_round_half_even(numerator: U256, denominator: U256) -> U256 {
    let (quotient, remainder) = numerator.div_mod(denominator);
    let rest = denominator - remainder;
    if remainder > rest || (remainder == rest && quotient.bit(0)) {
        quotient + U256::one()
    } else {
        quotient
    }
}
