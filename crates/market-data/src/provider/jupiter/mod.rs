//! Jupiter token list and price API.
//!
//! The token endpoint base URL is the candidate identifier of the metadata
//! family, so it is passed per call. The price endpoint is fixed.

use std::collections::HashMap;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use solbot_resilience::SourceError;

use super::http::{build_client, fetch_json, parse_decimal};
use crate::constants::JUPITER_PRICE_URL;
use crate::models::TokenMetadata;

const PROVIDER_ID: &str = "JUPITER";

/// Response from {base}/token/{mint}; `null` for unknown mints
#[derive(Debug, Deserialize)]
struct TokenResponse {
    address: String,
    name: String,
    symbol: String,
    decimals: u8,
}

/// Response from the price endpoint
#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    data: HashMap<String, Option<PriceEntry>>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    price: String,
}

pub struct JupiterProvider {
    client: Client,
    price_url: String,
}

impl JupiterProvider {
    pub fn new() -> Self {
        Self::with_price_url(JUPITER_PRICE_URL)
    }

    pub fn with_price_url(price_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            price_url: price_url.into(),
        }
    }

    /// Token metadata from the token API at `base_url`.
    pub async fn get_token(&self, base_url: &str, mint: &str) -> Result<TokenMetadata, SourceError> {
        let url = format!("{}/token/{}", base_url.trim_end_matches('/'), mint);
        let body: Option<TokenResponse> = fetch_json(self.client.get(url), PROVIDER_ID, mint).await?;
        let token = body.ok_or_else(|| SourceError::NotFound {
            provider: PROVIDER_ID.to_string(),
            what: mint.to_string(),
        })?;

        Ok(TokenMetadata::new(token.address, token.symbol, token.name, token.decimals))
    }

    /// USD(T) price of a mint.
    pub async fn get_price(&self, mint: &str) -> Result<Decimal, SourceError> {
        let request = self.client.get(&self.price_url).query(&[("ids", mint)]);
        let mut body: PriceResponse = fetch_json(request, PROVIDER_ID, mint).await?;
        let entry = body
            .data
            .remove(mint)
            .flatten()
            .ok_or_else(|| SourceError::NotFound {
                provider: PROVIDER_ID.to_string(),
                what: format!("price of {mint}"),
            })?;

        parse_decimal(PROVIDER_ID, "price", &entry.price)
    }
}

impl Default for JupiterProvider {
    fn default() -> Self {
        Self::new()
    }
}
