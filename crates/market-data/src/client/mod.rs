//! Family-backed clients, one per feed.
//!
//! Each client owns an [`Orchestrator`](solbot_resilience::Orchestrator) over
//! its family and supplies the request closure, fallback chain and
//! last-resort value for every operation.

mod metadata;
mod price;
mod rpc;

pub use metadata::{MetadataClient, MetadataSources};
pub use price::{PriceClient, PriceSources};
pub use rpc::{RpcConnection, SolanaRpcClient};
