//! Price feed backed by a pool of CoinGecko API keys.
//!
//! Current price order:
//! CoinGecko (keyed) -> CoinGecko public -> Binance -> Kraken -> OKX ->
//! Coinbase -> CryptoCompare -> static last-resort price.
//!
//! History order:
//! CoinGecko (keyed) -> CoinGecko public -> Binance klines -> flat series at
//! the last-resort price.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rust_decimal::Decimal;
use solbot_resilience::{
    FallbackChain, FamilyConfig, FamilyStats, Orchestrator, Resolution, SelectedCandidate,
    SourceError, SourceFamily,
};
use tokio::time::timeout;

use crate::constants::{
    BINANCE_BASE_URL, COINBASE_BASE_URL, COINGECKO_BASE_URL, COINGECKO_KEYS_ENV,
    CRYPTOCOMPARE_BASE_URL, KRAKEN_BASE_URL, OKX_BASE_URL,
};
use crate::feed::{FeedStatus, PriceFeed};
use crate::history::{build_history, flat_history};
use crate::models::{Asset, PriceHistory, PricePoint, PriceQuote};
use crate::provider::binance::BinanceProvider;
use crate::provider::coinbase::CoinbaseProvider;
use crate::provider::coingecko::CoinGeckoProvider;
use crate::provider::cryptocompare::CryptoCompareProvider;
use crate::provider::kraken::KrakenProvider;
use crate::provider::okx::OkxProvider;
use crate::provider::PriceProvider;
use crate::validator::PriceValidator;

const FAMILY: &str = "price";

/// Longest history range requested from any provider.
const MAX_HISTORY_DAYS: u32 = 365;

/// Base URLs of every price source.
#[derive(Clone, Debug)]
pub struct PriceSources {
    pub coingecko: String,
    pub binance: String,
    pub kraken: String,
    pub okx: String,
    pub coinbase: String,
    pub cryptocompare: String,
}

impl PriceSources {
    /// Point every source at one host; the paths do not overlap.
    pub fn all_at(base_url: &str) -> Self {
        Self {
            coingecko: base_url.to_string(),
            binance: base_url.to_string(),
            kraken: base_url.to_string(),
            okx: base_url.to_string(),
            coinbase: base_url.to_string(),
            cryptocompare: base_url.to_string(),
        }
    }
}

impl Default for PriceSources {
    fn default() -> Self {
        Self {
            coingecko: COINGECKO_BASE_URL.to_string(),
            binance: BINANCE_BASE_URL.to_string(),
            kraken: KRAKEN_BASE_URL.to_string(),
            okx: OKX_BASE_URL.to_string(),
            coinbase: COINBASE_BASE_URL.to_string(),
            cryptocompare: CRYPTOCOMPARE_BASE_URL.to_string(),
        }
    }
}

pub struct PriceClient {
    orchestrator: Orchestrator,
    coingecko: Arc<CoinGeckoProvider>,
    /// Public sources in fallback order, CoinGecko public first.
    fallbacks: Vec<Arc<dyn PriceProvider>>,
    validator: PriceValidator,
}

impl PriceClient {
    /// Client over the given API keys with default tuning and hosts.
    pub fn new(api_keys: Vec<String>) -> Self {
        let family = SourceFamily::new(FAMILY, api_keys, FamilyConfig::price_keys());
        Self::with_family(Arc::new(family), PriceSources::default())
    }

    /// Client over the keys in `COINGECKO_API_KEYS`.
    pub fn from_env() -> Self {
        let family = SourceFamily::from_env(FAMILY, COINGECKO_KEYS_ENV, &[], FamilyConfig::price_keys());
        Self::with_family(Arc::new(family), PriceSources::default())
    }

    pub fn with_family(family: Arc<SourceFamily>, sources: PriceSources) -> Self {
        let coingecko = Arc::new(CoinGeckoProvider::with_base_url(sources.coingecko));
        let fallbacks: Vec<Arc<dyn PriceProvider>> = vec![
            coingecko.clone(),
            Arc::new(BinanceProvider::with_base_url(sources.binance)),
            Arc::new(KrakenProvider::with_base_url(sources.kraken)),
            Arc::new(OkxProvider::with_base_url(sources.okx)),
            Arc::new(CoinbaseProvider::with_base_url(sources.coinbase)),
            Arc::new(CryptoCompareProvider::with_base_url(sources.cryptocompare)),
        ];

        Self {
            orchestrator: Orchestrator::new(family),
            coingecko,
            fallbacks,
            validator: PriceValidator::new(),
        }
    }

    pub fn family(&self) -> &Arc<SourceFamily> {
        self.orchestrator.family()
    }

    /// Names of the fallback steps, in order.
    pub fn fallback_order(&self) -> Vec<&'static str> {
        self.fallbacks.iter().map(|p| p.id()).collect()
    }
}

async fn keyed_price(
    coingecko: &CoinGeckoProvider,
    validator: &PriceValidator,
    asset: Asset,
    candidate: SelectedCandidate,
) -> Result<PriceQuote, SourceError> {
    let quote = coingecko.simple_price(asset, Some(&candidate.identifier)).await?;
    validator.validate_quote(&candidate.label, &quote)?;
    Ok(quote)
}

async fn public_price(
    provider: &dyn PriceProvider,
    validator: &PriceValidator,
    asset: Asset,
) -> Result<PriceQuote, SourceError> {
    let quote = provider.get_price(asset).await?;
    validator.validate_quote(provider.id(), &quote)?;
    Ok(quote)
}

async fn keyed_history(
    coingecko: &CoinGeckoProvider,
    validator: &PriceValidator,
    asset: Asset,
    days: u32,
    candidate: SelectedCandidate,
) -> Result<PriceHistory, SourceError> {
    let points = coingecko
        .market_chart(asset, days, Some(&candidate.identifier))
        .await?;
    validated_history(validator, &candidate.label, &points, days)
}

async fn public_history(
    provider: &dyn PriceProvider,
    validator: &PriceValidator,
    asset: Asset,
    days: u32,
) -> Result<PriceHistory, SourceError> {
    let points = provider.get_history(asset, days).await?;
    validated_history(validator, provider.id(), &points, days)
}

fn validated_history(
    validator: &PriceValidator,
    source: &str,
    points: &[PricePoint],
    days: u32,
) -> Result<PriceHistory, SourceError> {
    validator.validate_history(source, points)?;
    Ok(build_history(points, days))
}

#[async_trait]
impl FeedStatus for PriceClient {
    fn family(&self) -> &str {
        FAMILY
    }

    async fn check_status(&self) -> bool {
        let coingecko = &*self.coingecko;
        let keyed = self
            .orchestrator
            .sweep(move |candidate| async move { coingecko.ping(Some(&candidate.identifier)).await })
            .await;
        if keyed.is_some() {
            return true;
        }

        let public_timeout = self.family().config().fallback_timeout;
        match timeout(public_timeout, coingecko.ping(None)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("CoinGecko public ping failed: {}", e);
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
impl PriceFeed for PriceClient {
    async fn get_current_price(&self, asset: Asset) -> Resolution<PriceQuote> {
        let coingecko = &*self.coingecko;
        let validator = &self.validator;

        let mut chain = FallbackChain::new();
        for provider in &self.fallbacks {
            chain.push(provider.id(), public_price(provider.as_ref(), validator, asset));
        }

        self.orchestrator
            .execute(
                move |candidate| keyed_price(coingecko, validator, asset, candidate),
                chain,
                || PriceQuote::new(asset.last_resort_price(), Decimal::ZERO),
            )
            .await
    }

    async fn get_historical_prices(&self, asset: Asset, days: u32) -> Resolution<PriceHistory> {
        let days = days.clamp(1, MAX_HISTORY_DAYS);
        let coingecko = &*self.coingecko;
        let validator = &self.validator;

        let mut chain = FallbackChain::new();
        for provider in self.fallbacks.iter().filter(|p| p.supports_history()) {
            chain.push(
                provider.id(),
                public_history(provider.as_ref(), validator, asset, days),
            );
        }

        self.orchestrator
            .execute(
                move |candidate| keyed_history(coingecko, validator, asset, days, candidate),
                chain,
                || flat_history(asset.last_resort_price(), days, Utc::now()),
            )
            .await
    }
}
