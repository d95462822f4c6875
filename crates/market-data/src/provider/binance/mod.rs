//! Binance spot market provider.
//!
//! - Latest price via /api/v3/ticker/24hr
//! - Daily history via /api/v3/klines
//!
//! No API key is needed for market data.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use solbot_resilience::SourceError;

use super::http::{build_client, fetch_json, parse_decimal, transport_error};
use crate::constants::BINANCE_BASE_URL;
use crate::models::{Asset, PricePoint, PriceQuote, ProviderId};
use crate::provider::PriceProvider;

const PROVIDER_ID: &str = "BINANCE";

/// Binance reports an unknown symbol as HTTP 400 with this code.
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Response from /api/v3/ticker/24hr
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerResponse {
    last_price: String,
    price_change_percent: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: i64,
    msg: String,
}

pub struct BinanceProvider {
    client: Client,
    base_url: String,
}

impl BinanceProvider {
    pub fn new() -> Self {
        Self::with_base_url(BINANCE_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn ticker(&self, symbol: &str) -> Result<TickerResponse, SourceError> {
        let response = self
            .client
            .get(format!("{}/api/v3/ticker/24hr", self.base_url))
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, e))?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body: Option<ErrorResponse> = response.json().await.ok();
            return Err(match body {
                Some(err) if err.code == INVALID_SYMBOL_CODE => SourceError::NotFound {
                    provider: PROVIDER_ID.to_string(),
                    what: symbol.to_string(),
                },
                Some(err) => SourceError::Rejected {
                    provider: PROVIDER_ID.to_string(),
                    message: err.msg,
                },
                None => SourceError::from_status(PROVIDER_ID, 400),
            });
        }
        if !response.status().is_success() {
            return Err(SourceError::from_status(PROVIDER_ID, response.status().as_u16()));
        }

        response.json().await.map_err(|e| SourceError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: e.without_url().to_string(),
        })
    }
}

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for BinanceProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID
    }

    fn supports_history(&self) -> bool {
        true
    }

    async fn get_price(&self, asset: Asset) -> Result<PriceQuote, SourceError> {
        let ticker = self.ticker(asset.binance_symbol()).await?;
        Ok(PriceQuote::new(
            parse_decimal(PROVIDER_ID, "lastPrice", &ticker.last_price)?,
            parse_decimal(PROVIDER_ID, "priceChangePercent", &ticker.price_change_percent)?,
        ))
    }

    /// Daily klines; each row is `[open_time, open, high, low, close, ...]`.
    async fn get_history(&self, asset: Asset, days: u32) -> Result<Vec<PricePoint>, SourceError> {
        let symbol = asset.binance_symbol();
        let limit = days.clamp(1, 1000).to_string();
        let request = self
            .client
            .get(format!("{}/api/v3/klines", self.base_url))
            .query(&[("symbol", symbol), ("interval", "1d"), ("limit", limit.as_str())]);

        let rows: Vec<Vec<Value>> = fetch_json(request, PROVIDER_ID, symbol).await?;
        rows.iter().map(|row| kline_point(row)).collect()
    }
}

fn kline_point(row: &[Value]) -> Result<PricePoint, SourceError> {
    let malformed = |message: &str| SourceError::Malformed {
        provider: PROVIDER_ID.to_string(),
        message: message.to_string(),
    };

    let open_time = row
        .first()
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| malformed("kline open time"))?;
    let close = row
        .get(4)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("kline close"))?;

    Ok(PricePoint {
        timestamp: open_time,
        price: parse_decimal(PROVIDER_ID, "close", close)?,
    })
}
