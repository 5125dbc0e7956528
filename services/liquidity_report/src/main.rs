//! Liquidity Report
//!
//! Refreshes every configured AMM pool from Starknet, prices the tokens
//! through CoinGecko and prints reserves, fiat values and 5% depth.
//!
//! Architecture:
//! Starknet RPC → AmmRegistry ─┐
//!                             ├→ THIS REPORT
//! CoinGecko    → PriceOracle ─┘

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use amm::{AmmRegistry, PriceOracle};
use coingecko_adapter::CoinGeckoFeed;
use config::{AppConfig, DEFAULT_CONFIG_PATH};
use liquidity_report::{BuyQuote, BuyRequest, PoolReport, TotalsReport};
use starknet_adapter::StarknetBalanceReader;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "liquidity-report")]
#[command(about = "Constant-product pool reserves, fiat value and depth")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Environment override file (environments/<ENV>.toml next to the config)
    #[arg(short, long)]
    env: Option<String>,

    /// Only report this AMM
    #[arg(short, long)]
    amm: Option<String>,

    /// Preview buying AMOUNT whole units of SYMBOL in every pool holding it
    #[arg(short, long, value_name = "SYMBOL:AMOUNT")]
    buy: Vec<BuyRequest>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(Some(&args.config), args.env.as_deref())
        .context("Failed to load configuration")?;
    config.expand_env_vars()?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.global.log_level)),
        )
        .init();

    info!("Config file: {:?}", args.config);
    info!("Environment: {}", args.env.as_deref().unwrap_or("default"));

    config.validate()?;

    let registry = Arc::new(config.token_registry()?);
    let mut amms = config.build_amms(registry.clone())?;
    if let Some(name) = &args.amm {
        amms.retain(|amm| amm.name().eq_ignore_ascii_case(name));
        if amms.is_empty() {
            bail!("AMM '{}' not found in config", name);
        }
    }

    let reader = StarknetBalanceReader::new((&config.rpc).into())?;
    info!(endpoints = reader.endpoints().count(), "RPC: {}", config.rpc.primary_url);
    for amm in &mut amms {
        amm.refresh_all(&reader)
            .await
            .with_context(|| format!("Failed to refresh {}", amm.name()))?;
    }

    let symbols = priced_symbols(&amms);
    let feed = CoinGeckoFeed::new((&config.price_feed).into())?;
    let symbol_refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let oracle = PriceOracle::load(&feed, registry.clone(), &symbol_refs, &config.global.fiat)
        .await
        .context("Failed to load spot prices")?;

    for amm in &amms {
        print_amm(amm, &oracle, &args.buy)?;
    }

    Ok(())
}

/// Canonical symbols with a price id that appear in any reported pool
fn priced_symbols(amms: &[AmmRegistry]) -> BTreeSet<String> {
    amms.iter()
        .flat_map(|amm| amm.pools())
        .flat_map(|pool| pool.tokens().iter())
        .filter(|token| {
            amms.iter().any(|amm| {
                amm.token_registry()
                    .resolve(token.symbol())
                    .map(|info| info.price_id.is_some())
                    .unwrap_or(false)
            })
        })
        .map(|token| token.symbol().to_string())
        .collect()
}

fn print_amm(amm: &AmmRegistry, oracle: &PriceOracle, buys: &[BuyRequest]) -> Result<()> {
    let fiat = oracle.fiat();
    println!("== {} ({} pools) ==", amm.name(), amm.len());

    for pool in amm.pools() {
        match PoolReport::build(pool, oracle, amm.token_registry()) {
            Ok(report) => print!("{report}"),
            Err(e) => warn!(pool = %pool.id(), error = %e, "Skipping pool"),
        }
    }

    print!("{}", TotalsReport::build(amm, oracle)?);

    for request in buys {
        let mut quoted = false;
        for pool in amm.pools().filter(|p| p.token(&request.symbol).is_ok()) {
            quoted = true;
            match BuyQuote::preview(pool, oracle, request) {
                Ok(quote) => println!("{}", quote.render(fiat)),
                Err(e) => warn!(pool = %pool.id(), %request, error = %e, "Buy preview failed"),
            }
        }
        if !quoted {
            warn!(amm = %amm.name(), %request, "No pool holds the requested token");
        }
    }
    Ok(())
}
