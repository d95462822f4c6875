//! Solbot Market Data Crate
//!
//! Price, RPC and token-metadata feeds for the Solana trading dashboard,
//! built on the source families of `solbot-resilience`.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |    Dashboard     | --> |  PriceFeed etc.  |  (feed traits)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |     Clients      |  (PriceClient, SolanaRpcClient,
//!                          +------------------+   MetadataClient)
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   Orchestrator   |  (keyed family, fallback chain,
//!                          +------------------+   last resort)
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Providers     |  (CoinGecko, Binance, Jupiter, ...)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Asset`] - Tradable asset shown on the dashboard
//! - [`PriceQuote`] - Current price and 24h change
//! - [`PriceHistory`] - Thinned chart series with labels
//! - [`TokenMetadata`] - Symbol, name and decimals of an SPL mint
//!
//! # Type Aliases
//!
//! - [`ProviderId`] - Provider identifier (e.g., "BINANCE", "SOLSCAN")

pub mod client;
pub mod constants;
pub mod feed;
pub mod history;
pub mod models;
pub mod provider;
pub mod validator;

pub use client::{
    MetadataClient, MetadataSources, PriceClient, PriceSources, RpcConnection, SolanaRpcClient,
};
pub use feed::{FeedStatus, PriceFeed, RpcFeed, TokenMetadataFeed};
pub use models::{Asset, PriceHistory, PricePoint, PriceQuote, ProviderId, TokenMetadata, UnknownAsset};
pub use provider::{MetadataProvider, PriceProvider};
pub use validator::{PriceValidator, ValidationIssue, ValidationSeverity, ValidatorConfig};
