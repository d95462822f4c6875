//! Provider trait definitions.

use async_trait::async_trait;
use solbot_resilience::SourceError;

use crate::models::{Asset, PricePoint, PriceQuote, ProviderId, TokenMetadata};

/// A public price source used in the fallback chain.
///
/// Implementations make exactly one request per call and never retry;
/// retries, rotation and timeouts belong to the orchestrator.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Constant name like "BINANCE", used in logs and diagnostics.
    fn id(&self) -> ProviderId;

    /// Whether [`get_history`](Self::get_history) is implemented.
    fn supports_history(&self) -> bool {
        false
    }

    async fn get_price(&self, asset: Asset) -> Result<PriceQuote, SourceError>;

    /// Daily samples covering the last `days` days, oldest first.
    async fn get_history(&self, asset: Asset, days: u32) -> Result<Vec<PricePoint>, SourceError> {
        let _ = (asset, days);
        Err(SourceError::Unsupported {
            provider: self.id().to_string(),
            what: "historical prices".to_string(),
        })
    }
}

/// A public token metadata source used in the fallback chain.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn get_token(&self, mint: &str) -> Result<TokenMetadata, SourceError>;
}
