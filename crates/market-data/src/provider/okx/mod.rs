//! OKX market ticker provider (/api/v5/market/ticker).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use solbot_resilience::SourceError;

use super::http::{build_client, fetch_json, parse_decimal};
use crate::constants::OKX_BASE_URL;
use crate::models::{Asset, PriceQuote, ProviderId};
use crate::provider::PriceProvider;

const PROVIDER_ID: &str = "OKX";

/// "Instrument ID does not exist"
const UNKNOWN_INSTRUMENT_CODE: &str = "51001";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    last: String,
    open24h: String,
}

pub struct OkxProvider {
    client: Client,
    base_url: String,
}

impl OkxProvider {
    pub fn new() -> Self {
        Self::with_base_url(OKX_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for OkxProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for OkxProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID
    }

    async fn get_price(&self, asset: Asset) -> Result<PriceQuote, SourceError> {
        let instrument = asset.okx_instrument();
        let request = self
            .client
            .get(format!("{}/api/v5/market/ticker", self.base_url))
            .query(&[("instId", instrument)]);

        let body: TickerResponse = fetch_json(request, PROVIDER_ID, instrument).await?;
        if body.code == UNKNOWN_INSTRUMENT_CODE {
            return Err(SourceError::NotFound {
                provider: PROVIDER_ID.to_string(),
                what: instrument.to_string(),
            });
        }
        if body.code != "0" {
            return Err(SourceError::Rejected {
                provider: PROVIDER_ID.to_string(),
                message: format!("code {}: {}", body.code, body.msg),
            });
        }

        let ticker = body.data.first().ok_or_else(|| SourceError::NotFound {
            provider: PROVIDER_ID.to_string(),
            what: instrument.to_string(),
        })?;
        Ok(PriceQuote::from_open_and_last(
            parse_decimal(PROVIDER_ID, "open24h", &ticker.open24h)?,
            parse_decimal(PROVIDER_ID, "last", &ticker.last)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn test_ticker() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v5/market/ticker")
            .match_query(Matcher::UrlEncoded("instId".into(), "ETH-USDT".into()))
            .with_status(200)
            .with_body(r#"{"code":"0","msg":"","data":[{"instId":"ETH-USDT","last":"3150","open24h":"3000"}]}"#)
            .create_async()
            .await;

        let provider = OkxProvider::with_base_url(server.url());
        let quote = provider.get_price(Asset::Eth).await.unwrap();
        assert_eq!(quote.price, dec!(3150));
        assert_eq!(quote.change_24h, dec!(5));
    }

    #[tokio::test]
    async fn test_error_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v5/market/ticker")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":"50011","msg":"Too Many Requests","data":[]}"#)
            .create_async()
            .await;

        let provider = OkxProvider::with_base_url(server.url());
        let err = provider.get_price(Asset::Eth).await.unwrap_err();
        assert!(matches!(err, SourceError::Rejected { .. }));
    }
}
