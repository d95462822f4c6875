//! CoinGecko price provider.
//!
//! Two access patterns share one adapter:
//! - keyed: `/simple/price` and `/coins/{id}/market_chart` with a demo API key
//!   header, driven by the key family
//! - public: `/coins/{id}` (a different response shape) and the same chart
//!   endpoint without a key, used as the first fallback step
//!
//! API documentation: https://docs.coingecko.com/reference/introduction

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::Deserialize;
use solbot_resilience::SourceError;
use tracing::debug;

use super::http::{build_client, decimal_from_f64, fetch_json};
use crate::constants::COINGECKO_BASE_URL;
use crate::models::{Asset, PricePoint, PriceQuote, ProviderId};
use crate::provider::PriceProvider;

const PROVIDER_ID: &str = "COINGECKO";
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

// ============================================================================
// API Response Structures
// ============================================================================

/// Entry of the /simple/price map, keyed by coin id
#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// Response from /coins/{id}
#[derive(Debug, Deserialize)]
struct CoinResponse {
    market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    current_price: HashMap<String, f64>,
    price_change_percentage_24h: Option<f64>,
}

/// Response from /coins/{id}/market_chart
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// `[timestamp_ms, price]` pairs
    prices: Vec<[f64; 2]>,
}

// ============================================================================
// CoinGeckoProvider
// ============================================================================

pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self::with_base_url(COINGECKO_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, path: &str, api_key: Option<&str>) -> RequestBuilder {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        match api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Current price via `/simple/price`.
    pub async fn simple_price(
        &self,
        asset: Asset,
        api_key: Option<&str>,
    ) -> Result<PriceQuote, SourceError> {
        let id = asset.coingecko_id();
        let request = self.get("/simple/price", api_key).query(&[
            ("ids", id),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
        ]);

        let mut body: HashMap<String, SimplePrice> = fetch_json(request, PROVIDER_ID, id).await?;
        let entry = body.remove(id).ok_or_else(|| SourceError::NotFound {
            provider: PROVIDER_ID.to_string(),
            what: id.to_string(),
        })?;
        let price = entry.usd.ok_or_else(|| SourceError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: format!("no usd price for {id}"),
        })?;

        Ok(PriceQuote::new(
            decimal_from_f64(PROVIDER_ID, "usd", price)?,
            change_or_zero(entry.usd_24h_change)?,
        ))
    }

    /// Current price via the public `/coins/{id}` endpoint.
    pub async fn coin_price(&self, asset: Asset) -> Result<PriceQuote, SourceError> {
        let id = asset.coingecko_id();
        let request = self.get(&format!("/coins/{id}"), None).query(&[
            ("localization", "false"),
            ("tickers", "false"),
            ("community_data", "false"),
            ("developer_data", "false"),
        ]);

        let body: CoinResponse = fetch_json(request, PROVIDER_ID, id).await?;
        let market = body.market_data.ok_or_else(|| SourceError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: "missing market_data".to_string(),
        })?;
        let price = market
            .current_price
            .get("usd")
            .copied()
            .ok_or_else(|| SourceError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("no usd price for {id}"),
            })?;

        Ok(PriceQuote::new(
            decimal_from_f64(PROVIDER_ID, "current_price.usd", price)?,
            change_or_zero(market.price_change_percentage_24h)?,
        ))
    }

    /// Price samples over the last `days` days, oldest first.
    pub async fn market_chart(
        &self,
        asset: Asset,
        days: u32,
        api_key: Option<&str>,
    ) -> Result<Vec<PricePoint>, SourceError> {
        let id = asset.coingecko_id();
        let days = days.to_string();
        let request = self
            .get(&format!("/coins/{id}/market_chart"), api_key)
            .query(&[("vs_currency", "usd"), ("days", days.as_str())]);

        let body: MarketChartResponse = fetch_json(request, PROVIDER_ID, id).await?;
        debug!("CoinGecko market_chart for {}: {} samples", id, body.prices.len());

        body.prices
            .into_iter()
            .map(|[timestamp_ms, price]| {
                let timestamp = DateTime::from_timestamp_millis(timestamp_ms as i64).ok_or_else(
                    || SourceError::Malformed {
                        provider: PROVIDER_ID.to_string(),
                        message: format!("bad timestamp {timestamp_ms}"),
                    },
                )?;
                Ok(PricePoint {
                    timestamp,
                    price: decimal_from_f64(PROVIDER_ID, "prices", price)?,
                })
            })
            .collect()
    }

    /// Liveness check via `/ping`.
    pub async fn ping(&self, api_key: Option<&str>) -> Result<(), SourceError> {
        let _: serde_json::Value = fetch_json(self.get("/ping", api_key), PROVIDER_ID, "ping").await?;
        Ok(())
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn change_or_zero(change: Option<f64>) -> Result<Decimal, SourceError> {
    match change {
        Some(value) => Ok(decimal_from_f64(PROVIDER_ID, "24h change", value)?.round_dp(4)),
        None => Ok(Decimal::ZERO),
    }
}

/// The public (no key) access pattern, as a fallback step.
#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn id(&self) -> ProviderId {
        "COINGECKO_PUBLIC"
    }

    fn supports_history(&self) -> bool {
        true
    }

    async fn get_price(&self, asset: Asset) -> Result<PriceQuote, SourceError> {
        self.coin_price(asset).await
    }

    async fn get_history(&self, asset: Asset, days: u32) -> Result<Vec<PricePoint>, SourceError> {
        self.market_chart(asset, days, None).await
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn test_simple_price_sends_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/price")
            .match_header(API_KEY_HEADER, "CG-secret")
            .match_query(Matcher::UrlEncoded("ids".into(), "solana".into()))
            .with_status(200)
            .with_body(r#"{"solana":{"usd":150.25,"usd_24h_change":-1.5}}"#)
            .create_async()
            .await;

        let provider = CoinGeckoProvider::with_base_url(server.url());
        let quote = provider.simple_price(Asset::Sol, Some("CG-secret")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(quote.price, dec!(150.25));
        assert_eq!(quote.change_24h, dec!(-1.5));
    }

    #[tokio::test]
    async fn test_simple_price_missing_coin_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let provider = CoinGeckoProvider::with_base_url(server.url());
        let err = provider.simple_price(Asset::Sol, None).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_coin_price_public_shape() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/coins/bitcoin")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"id":"bitcoin","market_data":{"current_price":{"usd":64000.5,"eur":59000},"price_change_percentage_24h":0.75}}"#,
            )
            .create_async()
            .await;

        let provider = CoinGeckoProvider::with_base_url(server.url());
        let quote = provider.get_price(Asset::Btc).await.unwrap();
        assert_eq!(quote.price, dec!(64000.5));
        assert_eq!(quote.change_24h, dec!(0.75));
    }

    #[tokio::test]
    async fn test_market_chart() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/coins/solana/market_chart")
            .match_query(Matcher::UrlEncoded("days".into(), "2".into()))
            .with_status(200)
            .with_body(r#"{"prices":[[1700000000000,55.5],[1700086400000,57.0]]}"#)
            .create_async()
            .await;

        let provider = CoinGeckoProvider::with_base_url(server.url());
        let points = provider.market_chart(Asset::Sol, 2, None).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].price, dec!(57));
        assert_eq!(points[0].timestamp.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_rate_limited_key() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let provider = CoinGeckoProvider::with_base_url(server.url());
        let err = provider.simple_price(Asset::Sol, Some("k")).await.unwrap_err();
        assert_eq!(
            err,
            SourceError::RateLimited {
                provider: "COINGECKO".to_string()
            }
        );
    }
}
