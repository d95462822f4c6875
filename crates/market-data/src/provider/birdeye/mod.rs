//! Birdeye token overview (/defi/token_overview). Requires an API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solbot_resilience::SourceError;

use super::http::{build_client, decimal_from_f64, fetch_json};
use crate::constants::BIRDEYE_BASE_URL;
use crate::models::{ProviderId, TokenMetadata};
use crate::provider::MetadataProvider;

const PROVIDER_ID: &str = "BIRDEYE";

#[derive(Debug, Deserialize)]
struct OverviewResponse {
    success: bool,
    data: Option<Overview>,
}

#[derive(Debug, Deserialize)]
struct Overview {
    symbol: Option<String>,
    name: Option<String>,
    decimals: Option<u8>,
    price: Option<f64>,
}

pub struct BirdeyeProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BirdeyeProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(BIRDEYE_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl MetadataProvider for BirdeyeProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID
    }

    async fn get_token(&self, mint: &str) -> Result<TokenMetadata, SourceError> {
        let request = self
            .client
            .get(format!("{}/defi/token_overview", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .header("x-chain", "solana")
            .query(&[("address", mint)]);
        let body: OverviewResponse = fetch_json(request, PROVIDER_ID, mint).await?;

        let not_found = || SourceError::NotFound {
            provider: PROVIDER_ID.to_string(),
            what: mint.to_string(),
        };
        if !body.success {
            return Err(not_found());
        }
        let overview = body.data.ok_or_else(not_found)?;
        let (Some(symbol), Some(decimals)) = (overview.symbol, overview.decimals) else {
            return Err(not_found());
        };

        let mut token = TokenMetadata::new(
            mint,
            symbol.clone(),
            overview.name.unwrap_or(symbol),
            decimals,
        );
        if let Some(price) = overview.price {
            token.price_usdt = Some(decimal_from_f64(PROVIDER_ID, "price", price)?);
        }
        Ok(token)
    }
}
