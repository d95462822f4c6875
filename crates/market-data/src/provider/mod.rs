//! Upstream provider adapters.
//!
//! This module contains:
//! - The `PriceProvider` and `MetadataProvider` traits for fallback sources
//! - Keyed adapters whose credential or endpoint comes from a family
//!   candidate (CoinGecko, Solana RPC, Jupiter)
//! - Shared HTTP plumbing mapping transport and status failures to
//!   `SourceError`
//!
//! Adapters make one request per call and never retry. Every base URL is
//! injectable so tests can point them at a local mock server.

mod http;
mod traits;

pub mod binance;
pub mod birdeye;
pub mod coinbase;
pub mod coingecko;
pub mod cryptocompare;
pub mod jupiter;
pub mod kraken;
pub mod okx;
pub mod solana_rpc;
pub mod solscan;

pub use traits::{MetadataProvider, PriceProvider};
