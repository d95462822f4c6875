//! Domain models for quotes, chart history and token metadata.

mod asset;
mod quote;
mod token;

pub use asset::{Asset, UnknownAsset};
pub use quote::{PriceHistory, PricePoint, PriceQuote};
pub use token::TokenMetadata;

/// Provider identifier (e.g., "BINANCE", "SOLSCAN")
pub type ProviderId = &'static str;
