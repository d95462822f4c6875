//! CryptoCompare provider (/data/pricemultifull).

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solbot_resilience::SourceError;

use super::http::{build_client, decimal_from_f64, fetch_json};
use crate::constants::CRYPTOCOMPARE_BASE_URL;
use crate::models::{Asset, PriceQuote, ProviderId};
use crate::provider::PriceProvider;

const PROVIDER_ID: &str = "CRYPTOCOMPARE";

/// `RAW.<SYMBOL>.<CURRENCY>` on success; `Response: "Error"` otherwise.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PriceMultiFullResponse {
    #[serde(rename = "RAW", default)]
    raw: HashMap<String, HashMap<String, RawQuote>>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct RawQuote {
    price: f64,
    #[serde(rename = "CHANGEPCT24HOUR", default)]
    change_pct_24h: Option<f64>,
}

pub struct CryptoCompareProvider {
    client: Client,
    base_url: String,
}

impl CryptoCompareProvider {
    pub fn new() -> Self {
        Self::with_base_url(CRYPTOCOMPARE_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for CryptoCompareProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for CryptoCompareProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID
    }

    async fn get_price(&self, asset: Asset) -> Result<PriceQuote, SourceError> {
        let symbol = asset.ticker();
        let request = self
            .client
            .get(format!("{}/data/pricemultifull", self.base_url))
            .query(&[("fsyms", symbol), ("tsyms", "USD")]);

        let mut body: PriceMultiFullResponse = fetch_json(request, PROVIDER_ID, symbol).await?;
        if body.response.as_deref() == Some("Error") {
            return Err(SourceError::NotFound {
                provider: PROVIDER_ID.to_string(),
                what: body.message.unwrap_or_else(|| symbol.to_string()),
            });
        }

        let quote = body
            .raw
            .remove(symbol)
            .and_then(|mut by_currency| by_currency.remove("USD"))
            .ok_or_else(|| SourceError::NotFound {
                provider: PROVIDER_ID.to_string(),
                what: symbol.to_string(),
            })?;

        let change = match quote.change_pct_24h {
            Some(change) => decimal_from_f64(PROVIDER_ID, "CHANGEPCT24HOUR", change)?.round_dp(4),
            None => Default::default(),
        };
        Ok(PriceQuote::new(
            decimal_from_f64(PROVIDER_ID, "PRICE", quote.price)?,
            change,
        ))
    }
}
