//! Kraken public ticker provider (/0/public/Ticker).

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solbot_resilience::SourceError;

use super::http::{build_client, fetch_json, parse_decimal};
use crate::constants::KRAKEN_BASE_URL;
use crate::models::{Asset, PriceQuote, ProviderId};
use crate::provider::PriceProvider;

const PROVIDER_ID: &str = "KRAKEN";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: HashMap<String, PairTicker>,
}

#[derive(Debug, Deserialize)]
struct PairTicker {
    /// Last trade: `[price, lot volume]`
    c: Vec<String>,
    /// Today's opening price
    o: String,
}

pub struct KrakenProvider {
    client: Client,
    base_url: String,
}

impl KrakenProvider {
    pub fn new() -> Self {
        Self::with_base_url(KRAKEN_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for KrakenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for KrakenProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID
    }

    async fn get_price(&self, asset: Asset) -> Result<PriceQuote, SourceError> {
        let pair = asset.kraken_pair();
        let request = self
            .client
            .get(format!("{}/0/public/Ticker", self.base_url))
            .query(&[("pair", pair)]);

        let body: TickerResponse = fetch_json(request, PROVIDER_ID, pair).await?;
        if let Some(error) = body.error.first() {
            return Err(if error.contains("Unknown asset pair") {
                SourceError::NotFound {
                    provider: PROVIDER_ID.to_string(),
                    what: pair.to_string(),
                }
            } else {
                SourceError::Rejected {
                    provider: PROVIDER_ID.to_string(),
                    message: error.clone(),
                }
            });
        }

        // Kraken may answer under its own pair name (e.g. XXBTZUSD)
        let ticker = body
            .result
            .into_values()
            .next()
            .ok_or_else(|| SourceError::NotFound {
                provider: PROVIDER_ID.to_string(),
                what: pair.to_string(),
            })?;
        let last = ticker.c.first().ok_or_else(|| SourceError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: "empty last trade".to_string(),
        })?;

        Ok(PriceQuote::from_open_and_last(
            parse_decimal(PROVIDER_ID, "o", &ticker.o)?,
            parse_decimal(PROVIDER_ID, "c", last)?,
        ))
    }
}
