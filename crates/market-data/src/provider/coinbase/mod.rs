//! Coinbase Exchange product stats provider (/products/{id}/stats).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solbot_resilience::SourceError;

use super::http::{build_client, fetch_json, parse_decimal};
use crate::constants::COINBASE_BASE_URL;
use crate::models::{Asset, PriceQuote, ProviderId};
use crate::provider::PriceProvider;

const PROVIDER_ID: &str = "COINBASE";

#[derive(Debug, Deserialize)]
struct StatsResponse {
    open: String,
    last: String,
}

pub struct CoinbaseProvider {
    client: Client,
    base_url: String,
}

impl CoinbaseProvider {
    pub fn new() -> Self {
        Self::with_base_url(COINBASE_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for CoinbaseProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for CoinbaseProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID
    }

    async fn get_price(&self, asset: Asset) -> Result<PriceQuote, SourceError> {
        let product = asset
            .coinbase_product()
            .ok_or_else(|| SourceError::Unsupported {
                provider: PROVIDER_ID.to_string(),
                what: format!("{asset}-USD"),
            })?;

        let request = self
            .client
            .get(format!("{}/products/{}/stats", self.base_url, product));
        let stats: StatsResponse = fetch_json(request, PROVIDER_ID, product).await?;

        Ok(PriceQuote::from_open_and_last(
            parse_decimal(PROVIDER_ID, "open", &stats.open)?,
            parse_decimal(PROVIDER_ID, "last", &stats.last)?,
        ))
    }
}
