//! Token metadata feed backed by a pool of Jupiter token API hosts.
//!
//! Order: Jupiter (family) -> Solscan -> Birdeye (when a key is set) ->
//! well-known mint table -> `UNKNOWN`.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use solbot_resilience::{
    FallbackChain, FamilyConfig, FamilyStats, Orchestrator, Resolution, SourceFamily,
};
use tokio::time::timeout;

use crate::constants::{
    well_known_token, BIRDEYE_BASE_URL, DEFAULT_JUPITER_API_URLS, JUPITER_API_URLS_ENV,
    JUPITER_PRICE_URL, SOLSCAN_BASE_URL, SOL_MINT,
};
use crate::feed::{FeedStatus, TokenMetadataFeed};
use crate::models::TokenMetadata;
use crate::provider::birdeye::BirdeyeProvider;
use crate::provider::jupiter::JupiterProvider;
use crate::provider::solscan::SolscanProvider;
use crate::provider::MetadataProvider;

const FAMILY: &str = "metadata";

/// Hosts of the sources outside the Jupiter family.
#[derive(Clone, Debug)]
pub struct MetadataSources {
    pub jupiter_price: String,
    pub solscan: String,
    pub birdeye: String,
    /// Birdeye is only consulted when this is set.
    pub birdeye_api_key: Option<String>,
}

impl Default for MetadataSources {
    fn default() -> Self {
        Self {
            jupiter_price: JUPITER_PRICE_URL.to_string(),
            solscan: SOLSCAN_BASE_URL.to_string(),
            birdeye: BIRDEYE_BASE_URL.to_string(),
            birdeye_api_key: None,
        }
    }
}

pub struct MetadataClient {
    orchestrator: Orchestrator,
    jupiter: JupiterProvider,
    fallbacks: Vec<Box<dyn MetadataProvider>>,
}

impl MetadataClient {
    /// Client over Jupiter token API bases, or the public hosts when empty.
    pub fn new(base_urls: Vec<String>, birdeye_api_key: Option<String>) -> Self {
        let base_urls = if base_urls.is_empty() {
            DEFAULT_JUPITER_API_URLS.iter().map(|s| s.to_string()).collect()
        } else {
            base_urls
        };
        let family = SourceFamily::new(FAMILY, base_urls, FamilyConfig::metadata_endpoints());
        let sources = MetadataSources {
            birdeye_api_key,
            ..MetadataSources::default()
        };
        Self::with_family(Arc::new(family), sources)
    }

    /// Client over the hosts in `JUPITER_API_URLS`.
    pub fn from_env(birdeye_api_key: Option<String>) -> Self {
        let family = SourceFamily::from_env(
            FAMILY,
            JUPITER_API_URLS_ENV,
            DEFAULT_JUPITER_API_URLS,
            FamilyConfig::metadata_endpoints(),
        );
        let sources = MetadataSources {
            birdeye_api_key,
            ..MetadataSources::default()
        };
        Self::with_family(Arc::new(family), sources)
    }

    pub fn with_family(family: Arc<SourceFamily>, sources: MetadataSources) -> Self {
        let mut fallbacks: Vec<Box<dyn MetadataProvider>> =
            vec![Box::new(SolscanProvider::with_base_url(sources.solscan))];
        if let Some(key) = sources.birdeye_api_key.filter(|k| !k.trim().is_empty()) {
            fallbacks.push(Box::new(BirdeyeProvider::with_base_url(sources.birdeye, key)));
        }

        Self {
            orchestrator: Orchestrator::new(family),
            jupiter: JupiterProvider::with_price_url(sources.jupiter_price),
            fallbacks,
        }
    }

    pub fn family(&self) -> &Arc<SourceFamily> {
        self.orchestrator.family()
    }

    pub fn fallback_order(&self) -> Vec<&'static str> {
        self.fallbacks.iter().map(|p| p.id()).collect()
    }
}

fn last_resort_token(mint: &str) -> TokenMetadata {
    well_known_token(mint).unwrap_or_else(|| TokenMetadata::unknown(mint))
}

#[async_trait]
impl FeedStatus for MetadataClient {
    fn family(&self) -> &str {
        FAMILY
    }

    async fn check_status(&self) -> bool {
        let jupiter = &self.jupiter;
        let keyed = self
            .orchestrator
            .sweep(move |candidate| async move {
                jupiter
                    .get_token(&candidate.identifier, SOL_MINT)
                    .await
                    .map(|_| ())
            })
            .await;
        if keyed.is_some() {
            return true;
        }

        let Some(public) = self.fallbacks.first() else {
            return false;
        };
        let public_timeout = self.family().config().fallback_timeout;
        match timeout(public_timeout, public.get_token(SOL_MINT)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("{} status check failed: {}", public.id(), e);
                false
            }
            Err(_) => false,
        }
    }

    fn get_last_error(&self) -> Option<String> {
        self.family().last_error()
    }

    fn reset_state(&self) {
        self.family().reset();
    }

    fn get_stats(&self) -> FamilyStats {
        self.family().stats()
    }
}

#[async_trait]
impl TokenMetadataFeed for MetadataClient {
    async fn get_token_metadata(&self, mint: &str) -> Resolution<TokenMetadata> {
        let jupiter = &self.jupiter;

        let mut chain = FallbackChain::new();
        for provider in &self.fallbacks {
            chain.push(provider.id(), provider.get_token(mint));
        }

        let mut resolution = self
            .orchestrator
            .execute(
                move |candidate| async move { jupiter.get_token(&candidate.identifier, mint).await },
                chain,
                || last_resort_token(mint),
            )
            .await;

        if resolution.value.price_usdt.is_none() {
            let price_timeout = self.family().config().fallback_timeout;
            match timeout(price_timeout, jupiter.get_price(mint)).await {
                Ok(Ok(price)) => resolution.value.price_usdt = Some(price),
                Ok(Err(e)) => debug!("No USDT price for {}: {}", mint, e),
                Err(_) => debug!("USDT price lookup for {} timed out", mint),
            }
        }

        resolution
    }
}
