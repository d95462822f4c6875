//! Solscan public token metadata (/token/meta).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solbot_resilience::SourceError;

use super::http::{build_client, fetch_json};
use crate::constants::SOLSCAN_BASE_URL;
use crate::models::{ProviderId, TokenMetadata};
use crate::provider::MetadataProvider;

const PROVIDER_ID: &str = "SOLSCAN";

#[derive(Debug, Deserialize)]
struct TokenMetaResponse {
    symbol: Option<String>,
    name: Option<String>,
    decimals: Option<u8>,
}

pub struct SolscanProvider {
    client: Client,
    base_url: String,
}

impl SolscanProvider {
    pub fn new() -> Self {
        Self::with_base_url(SOLSCAN_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Cheapest request that proves the API answers.
    pub async fn ping(&self, mint: &str) -> Result<(), SourceError> {
        self.get_token(mint).await.map(|_| ())
    }
}

impl Default for SolscanProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProvider for SolscanProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID
    }

    async fn get_token(&self, mint: &str) -> Result<TokenMetadata, SourceError> {
        let request = self
            .client
            .get(format!("{}/token/meta", self.base_url))
            .query(&[("address", mint)]);
        let meta: TokenMetaResponse = fetch_json(request, PROVIDER_ID, mint).await?;

        // An unknown mint comes back as an empty object
        match (meta.symbol, meta.decimals) {
            (Some(symbol), Some(decimals)) if !symbol.is_empty() => Ok(TokenMetadata::new(
                mint,
                symbol.clone(),
                meta.name.unwrap_or(symbol),
                decimals,
            )),
            _ => Err(SourceError::NotFound {
                provider: PROVIDER_ID.to_string(),
                what: mint.to_string(),
            }),
        }
    }
}
