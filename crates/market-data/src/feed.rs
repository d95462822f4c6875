//! Traits the dashboard consumes.
//!
//! Each client implements one of these so the server (and its tests) can
//! hold `Arc<dyn ...>` without knowing which providers sit behind it. None of
//! the query operations can fail: the worst case is a last-resort value or
//! `None`.

use async_trait::async_trait;
use solbot_resilience::{FamilyStats, Resolution};

use crate::models::{Asset, PriceHistory, PriceQuote, TokenMetadata};

/// Health operations shared by every family-backed client.
#[async_trait]
pub trait FeedStatus: Send + Sync {
    /// Family name ("price", "rpc", "metadata").
    fn family(&self) -> &str;

    /// Check the keyed candidates, then the public path. `true` if anything
    /// answered.
    async fn check_status(&self) -> bool;

    /// Most recent failure message, for the UI warning banner.
    fn get_last_error(&self) -> Option<String>;

    /// Forget all health history. Idempotent.
    fn reset_state(&self);

    fn get_stats(&self) -> FamilyStats;
}

#[async_trait]
pub trait PriceFeed: FeedStatus {
    async fn get_current_price(&self, asset: Asset) -> Resolution<PriceQuote>;

    /// Chart series over `days`, thinned to a handful of points.
    async fn get_historical_prices(&self, asset: Asset, days: u32) -> Resolution<PriceHistory>;
}

#[async_trait]
pub trait RpcFeed: FeedStatus {
    /// URL of an endpoint that currently reports healthy.
    async fn get_healthy_endpoint(&self) -> Option<String>;

    /// Wallet balance in lamports; `None` when no endpoint answered.
    async fn get_balance(&self, address: &str) -> Option<u64>;
}

/// Optional capability: dashboards without a metadata source simply do not
/// hold one.
#[async_trait]
pub trait TokenMetadataFeed: FeedStatus {
    async fn get_token_metadata(&self, mint: &str) -> Resolution<TokenMetadata>;
}
