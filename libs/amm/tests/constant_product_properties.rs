//! Constant-Product Pool Property Tests
//!
//! Properties that must hold for any reserve state, independent of the
//! concrete pools configured for an exchange.

use amm::{dec, format_fiat, AmmError, AmmRegistry, Decimal, Pool, PriceOracle, U256};
use proptest::prelude::*;
use std::sync::Arc;
use types::{TokenInfo, TokenRegistry};

fn registry() -> Arc<TokenRegistry> {
    Arc::new(
        TokenRegistry::builder()
            .token(TokenInfo::new("ETH", "0xeth", 18).with_price_id("ethereum"))
            .token(TokenInfo::new("USDC", "0xusdc", 6).with_price_id("usd-coin"))
            .token(TokenInfo::new("WBTC", "0xwbtc", 8).with_display("wBTC"))
            .token(TokenInfo::new("DAI", "0xdai", 18))
            .build()
            .unwrap(),
    )
}

fn loaded_pool(eth: u128, usdc: u128) -> Pool {
    let mut pool = Pool::new(registry(), "ETH", "USDC", "0xpool").unwrap();
    pool.apply_balances([U256::from(eth), U256::from(usdc)]).unwrap();
    pool
}

fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

const SYMBOLS: &[&str] = &["ETH", "USDC", "WBTC", "wBTC", "DAI"];

proptest! {
    #[test]
    fn prop_simulate_buy_preserves_constant_product(
        eth in 1_000_000u128..1_000_000_000_000_000_000_000_000u128,
        usdc in 1_000_000u128..1_000_000_000_000_000_000u128,
        fraction in 0u32..10_000u32,
        buy_eth in any::<bool>(),
    ) {
        let mut pool = loaded_pool(eth, usdc);
        let k = pool.constant_product().unwrap();

        let (symbol, reserve) = if buy_eth { ("ETH", eth) } else { ("USDC", usdc) };
        // strictly below the reserve
        let amount = reserve / 10_000 * fraction as u128;

        pool.simulate_buy(symbol, U256::from(amount)).unwrap();

        let new_buy = pool.token(symbol).unwrap().balance_base().unwrap();
        let new_k = pool.constant_product().unwrap();

        // new_sell = round(k / new_buy), so |new_k - k| <= new_buy / 2
        prop_assert!(abs_diff(new_k, k) * U256::from(2u8) <= new_buy);
        prop_assert_eq!(new_buy, U256::from(reserve - amount));
    }

    #[test]
    fn prop_buying_whole_reserve_fails(
        eth in 1u128..1_000_000_000_000_000_000_000u128,
        usdc in 1u128..1_000_000_000_000u128,
        extra in 0u128..1_000u128,
    ) {
        let mut pool = loaded_pool(eth, usdc);
        let before = pool.snapshot();

        let result = pool.simulate_buy("ETH", U256::from(eth + extra));
        let is_insufficient = matches!(result, Err(AmmError::InsufficientLiquidity { .. }));
        prop_assert!(is_insufficient);

        let result = pool.simulate_buy("USDC", U256::from(usdc + extra));
        let is_insufficient = matches!(result, Err(AmmError::InsufficientLiquidity { .. }));
        prop_assert!(is_insufficient);

        prop_assert_eq!(pool.snapshot(), before);
    }

    #[test]
    fn prop_pair_key_order_independent(a in 0usize..5, b in 0usize..5) {
        let amm = AmmRegistry::new("test", registry());
        prop_assert_eq!(
            amm.pair_key(SYMBOLS[a], SYMBOLS[b]),
            amm.pair_key(SYMBOLS[b], SYMBOLS[a])
        );
    }

    #[test]
    fn prop_to_fiat_is_linear(
        raw in 0u128..1_000_000_000_000_000u128,
        price_mantissa in 1i64..1_000_000_000i64,
        price_scale in 0u32..6u32,
        eth in any::<bool>(),
    ) {
        let price = Decimal::new(price_mantissa, price_scale);
        let oracle = PriceOracle::from_prices(
            registry(),
            "usd",
            [("ETH", price), ("USDC", price)],
        ).unwrap();
        let symbol = if eth { "ETH" } else { "USDC" };

        let single = oracle.to_fiat(U256::from(raw), symbol).unwrap();
        let double = oracle.to_fiat(U256::from(raw * 2), symbol).unwrap();
        prop_assert_eq!(double, single * dec!(2));
    }

    #[test]
    fn prop_display_clamps_dust(mantissa in -999i64..=999i64) {
        // |value| <= 0.00000999
        let value = Decimal::new(mantissa, 8);
        prop_assert_eq!(format_fiat(value, "usd"), "$0");
    }

    #[test]
    fn prop_display_has_five_decimals(mantissa in 1_000i64..1_000_000_000_000i64) {
        let value = Decimal::new(mantissa, 8);
        let shown = format_fiat(value, "usd");
        prop_assert!(shown.starts_with('$'));
        let (_, fraction) = shown.split_once('.').unwrap();
        prop_assert_eq!(fraction.len(), 5);
    }
}

#[test]
fn test_buy_one_eth_from_ten_eth_pool() {
    let mut pool = loaded_pool(10_000_000_000_000_000_000, 20_000_000_000);
    let paid = pool
        .simulate_buy("ETH", U256::from(1_000_000_000_000_000_000u128))
        .unwrap();
    assert_eq!(paid, U256::from(2_222_222_222u64));

    let usdc = pool.token("USDC").unwrap().balance_converted().unwrap();
    assert!((usdc - dec!(22222.222222)).abs() < dec!(0.000001));
}
