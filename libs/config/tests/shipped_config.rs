//! The configuration shipped in the repository stays loadable and consistent

use config::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;

fn shipped() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/jediswap.toml")
}

#[test]
fn test_shipped_config_is_valid() {
    let config = AppConfig::load(Some(&shipped()), None).unwrap();
    config.validate().unwrap();

    assert_eq!(config.tokens.len(), 5);
    let jediswap = config.amm("JediSwap").unwrap();
    assert_eq!(jediswap.pools.len(), 10);
    assert_eq!(jediswap.fee_bps, 0);
}

#[test]
fn test_shipped_registry_prices_every_token() {
    let config = AppConfig::load(Some(&shipped()), None).unwrap();
    let registry = config.token_registry().unwrap();

    let ids: Vec<String> = registry.price_ids().into_iter().map(|(id, _)| id).collect();
    for id in ["bitcoin", "dai", "ethereum", "tether", "usd-coin"] {
        assert!(ids.iter().any(|i| i == id), "missing price id {id}");
    }
    assert_eq!(registry.normalize("wBTC"), "WBTC");
    assert_eq!(registry.normalize("zUSDC"), "USDC");
}

#[test]
fn test_shipped_pools_resolve_in_either_order() {
    let config = AppConfig::load(Some(&shipped()), None).unwrap();
    let registry = Arc::new(config.token_registry().unwrap());
    let amms = config.build_amms(registry).unwrap();

    let jediswap = &amms[0];
    assert_eq!(
        jediswap.get_pool("ETH", "wBTC").unwrap().address(),
        "0x0260e98362e0949fefff8b4de85367c035e44f734c9f8069b6ce2075ae86b45c"
    );
    assert_eq!(
        jediswap.get_pool("USDT", "USDC").unwrap().address(),
        "0x05801bdad32f343035fb242e98d1e9371ae85bc1543962fedea16c59b35bd19b"
    );
}
