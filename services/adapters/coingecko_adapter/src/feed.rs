//! `simple/price` client and response parsing

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::CoinGeckoConfig;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

#[derive(Debug, Error)]
pub enum CoinGeckoError {
    #[error("Failed getting prices, status code {status}")]
    Status { status: u16 },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid {fiat} price for {id}: {value}")]
    InvalidPrice {
        id: String,
        fiat: String,
        value: String,
    },
}

pub struct CoinGeckoFeed {
    client: reqwest::Client,
    config: CoinGeckoConfig,
}

impl CoinGeckoFeed {
    pub fn new(config: CoinGeckoConfig) -> Result<Self, CoinGeckoError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|source| CoinGeckoError::Request {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self { client, config })
    }

    /// `{base}/simple/price?ids=a,b&vs_currencies=fiat`
    pub fn price_url(&self, ids: &[String], fiat: &str) -> Result<Url, CoinGeckoError> {
        let raw = format!("{}/simple/price", self.config.base_url);
        let mut url = Url::parse(&raw).map_err(|e| CoinGeckoError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("vs_currencies", fiat);
        Ok(url)
    }

    /// One batched request for every id
    pub async fn fetch(
        &self,
        ids: &[String],
        fiat: &str,
    ) -> Result<HashMap<String, Decimal>, CoinGeckoError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.price_url(ids, fiat)?;
        debug!(%url, "Requesting spot prices");

        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|source| CoinGeckoError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Price request rejected");
            return Err(CoinGeckoError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CoinGeckoError::InvalidResponse(e.to_string()))?;

        parse_simple_price(&body, fiat)
    }
}

#[async_trait]
impl amm::PriceFeed for CoinGeckoFeed {
    async fn fetch_prices(
        &self,
        ids: &[String],
        fiat: &str,
    ) -> anyhow::Result<HashMap<String, Decimal>> {
        Ok(self.fetch(ids, fiat).await?)
    }
}

/// Prices from a `{"<id>": {"<fiat>": <number>}}` body
///
/// Ids without a quote in `fiat` are left out of the map.
pub fn parse_simple_price(
    body: &Value,
    fiat: &str,
) -> Result<HashMap<String, Decimal>, CoinGeckoError> {
    let entries = body
        .as_object()
        .ok_or_else(|| CoinGeckoError::InvalidResponse(format!("expected object, got {body}")))?;

    let mut prices = HashMap::with_capacity(entries.len());
    for (id, quotes) in entries {
        let quote = match quotes.get(fiat) {
            None | Some(Value::Null) => continue,
            Some(quote) => quote,
        };
        let price = match quote {
            Value::Number(number) => decimal_from_number(number),
            _ => None,
        }
        .ok_or_else(|| CoinGeckoError::InvalidPrice {
            id: id.clone(),
            fiat: fiat.to_string(),
            value: quote.to_string(),
        })?;
        prices.insert(id.clone(), price);
    }
    Ok(prices)
}

// JSON numbers go through their shortest decimal text, never f64 math
fn decimal_from_number(number: &Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .map(|d| d.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_simple_price() {
        let body = json!({
            "ethereum": { "usd": 2000.0 },
            "bitcoin": { "usd": 60123.45 },
            "usd-coin": { "usd": 0.999812 },
            "tether": { "usd": 1 }
        });

        let prices = parse_simple_price(&body, "usd").unwrap();
        assert_eq!(prices["ethereum"], dec!(2000));
        assert_eq!(prices["bitcoin"], dec!(60123.45));
        assert_eq!(prices["usd-coin"], dec!(0.999812));
        assert_eq!(prices["tether"], dec!(1));
    }

    #[test]
    fn test_parse_scientific_notation() {
        let body = json!({ "shib": { "usd": 1.234e-5 } });
        let prices = parse_simple_price(&body, "usd").unwrap();
        assert_eq!(prices["shib"], dec!(0.00001234));
    }

    #[test]
    fn test_missing_quote_is_absent() {
        let body = json!({
            "ethereum": { "eur": 1850.0 },
            "dai": {},
            "tether": { "usd": null }
        });
        assert!(parse_simple_price(&body, "usd").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_numeric_price() {
        let body = json!({ "ethereum": { "usd": "2000" } });
        assert!(matches!(
            parse_simple_price(&body, "usd"),
            Err(CoinGeckoError::InvalidPrice { .. })
        ));
        assert!(parse_simple_price(&json!([1, 2]), "usd").is_err());
    }

    #[test]
    fn test_price_url() {
        let feed = CoinGeckoFeed::new(CoinGeckoConfig::default()).unwrap();
        let ids = vec!["bitcoin".to_string(), "ethereum".to_string()];
        let url = feed.price_url(&ids, "usd").unwrap();

        assert_eq!(url.path(), "/api/v3/simple/price");
        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["ids"], "bitcoin,ethereum");
        assert_eq!(query["vs_currencies"], "usd");
    }
}
