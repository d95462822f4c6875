use std::sync::Arc;

use solbot_market_data::{
    MetadataClient, PriceClient, PriceFeed, RpcConnection, RpcFeed, SolanaRpcClient,
    TokenMetadataFeed,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub price_feed: Arc<dyn PriceFeed>,
    pub rpc_feed: Arc<dyn RpcFeed>,
    pub rpc_connection: Arc<RpcConnection>,
    /// `None` when the metadata capability is disabled.
    pub metadata_feed: Option<Arc<dyn TokenMetadataFeed>>,
    pub degraded_ratio: f64,
}

impl AppState {
    pub fn new(
        price_feed: Arc<dyn PriceFeed>,
        rpc_feed: Arc<dyn RpcFeed>,
        metadata_feed: Option<Arc<dyn TokenMetadataFeed>>,
        degraded_ratio: f64,
    ) -> Self {
        Self {
            rpc_connection: Arc::new(RpcConnection::new(rpc_feed.clone())),
            price_feed,
            rpc_feed,
            metadata_feed,
            degraded_ratio,
        }
    }
}

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> Arc<AppState> {
    let price_feed: Arc<dyn PriceFeed> =
        Arc::new(PriceClient::new(config.coingecko_api_keys.clone()));
    let rpc_feed: Arc<dyn RpcFeed> = Arc::new(SolanaRpcClient::new(config.solana_rpc_urls.clone()));
    let metadata_feed: Option<Arc<dyn TokenMetadataFeed>> = if config.metadata_enabled {
        Some(Arc::new(MetadataClient::new(
            config.jupiter_api_urls.clone(),
            config.birdeye_api_key.clone(),
        )))
    } else {
        tracing::info!("Token metadata disabled");
        None
    };

    tracing::info!(
        "Configured {} CoinGecko key(s), {} RPC endpoint(s)",
        config.coingecko_api_keys.len(),
        rpc_feed.get_stats().total_keys
    );

    Arc::new(AppState::new(
        price_feed,
        rpc_feed,
        metadata_feed,
        config.degraded_ratio,
    ))
}
