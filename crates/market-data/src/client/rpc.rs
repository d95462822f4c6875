//! Solana RPC endpoint pool and the dashboard's connection state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::{info, warn};
use solbot_resilience::{FallbackChain, FamilyConfig, FamilyStats, Orchestrator, SourceFamily};

use crate::constants::{DEFAULT_SOLANA_RPC_URLS, SOLANA_RPC_URLS_ENV};
use crate::feed::{FeedStatus, RpcFeed};
use crate::provider::solana_rpc::SolanaRpc;

const FAMILY: &str = "rpc";

pub struct SolanaRpcClient {
    orchestrator: Orchestrator,
    rpc: SolanaRpc,
}

impl SolanaRpcClient {
    /// Client over `endpoints`, or the public mainnet endpoints when empty.
    pub fn new(endpoints: Vec<String>) -> Self {
        let endpoints = if endpoints.is_empty() {
            DEFAULT_SOLANA_RPC_URLS.iter().map(|s| s.to_string()).collect()
        } else {
            endpoints
        };
        let family = SourceFamily::new(FAMILY, endpoints, FamilyConfig::rpc_endpoints());
        Self::with_family(Arc::new(family))
    }

    /// Client over the endpoints in `SOLANA_RPC_URLS`.
    pub fn from_env() -> Self {
        let family = SourceFamily::from_env(
            FAMILY,
            SOLANA_RPC_URLS_ENV,
            DEFAULT_SOLANA_RPC_URLS,
            FamilyConfig::rpc_endpoints(),
        );
        Self::with_family(Arc::new(family))
    }

    pub fn with_family(family: Arc<SourceFamily>) -> Self {
        Self {
            orchestrator: Orchestrator::new(family),
            rpc: SolanaRpc::new(),
        }
    }

    pub fn family(&self) -> &Arc<SourceFamily> {
        self.orchestrator.family()
    }
}

#[async_trait]
impl FeedStatus for SolanaRpcClient {
    fn family(&self) -> &str {
        FAMILY
    }

    /// RPC endpoints have no public path beyond the pool itself.
    async fn check_status(&self) -> bool {
        self.get_healthy_endpoint().await.is_some()
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
impl RpcFeed for SolanaRpcClient {
    async fn get_healthy_endpoint(&self) -> Option<String> {
        let rpc = &self.rpc;
        self.orchestrator
            .sweep(move |candidate| async move { rpc.get_health(&candidate.identifier).await })
            .await
            .map(|candidate| candidate.identifier)
    }

    async fn get_balance(&self, address: &str) -> Option<u64> {
        let rpc = &self.rpc;
        self.orchestrator
            .execute(
                move |candidate| async move {
                    rpc.get_balance(&candidate.identifier, address).await.map(Some)
                },
                FallbackChain::new(),
                || None,
            )
            .await
            .into_value()
    }
}

/// Endpoint the dashboard is currently talking to.
///
/// When no endpoint is healthy the dashboard switches to simulation mode and
/// keeps working with synthetic balances until the next successful refresh.
pub struct RpcConnection {
    feed: Arc<dyn RpcFeed>,
    endpoint: RwLock<Option<String>>,
    simulation_mode: AtomicBool,
}

impl RpcConnection {
    pub fn new(feed: Arc<dyn RpcFeed>) -> Self {
        Self {
            feed,
            endpoint: RwLock::new(None),
            simulation_mode: AtomicBool::new(false),
        }
    }

    /// Resolve a healthy endpoint and update simulation mode. Returns the
    /// endpoint, if any.
    pub async fn refresh(&self) -> Option<String> {
        let endpoint = self.feed.get_healthy_endpoint().await;
        let simulate = endpoint.is_none();

        let was_simulating = self.simulation_mode.swap(simulate, Ordering::SeqCst);
        match (was_simulating, simulate) {
            (false, true) => warn!("No healthy RPC endpoint, entering simulation mode"),
            (true, false) => info!("RPC endpoint available again, leaving simulation mode"),
            _ => {}
        }

        match self.endpoint.write() {
            Ok(mut guard) => *guard = endpoint.clone(),
            Err(poisoned) => *poisoned.into_inner() = endpoint.clone(),
        }
        endpoint
    }

    /// Endpoint found by the last refresh.
    pub fn endpoint(&self) -> Option<String> {
        match self.endpoint.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_simulation_mode(&self) -> bool {
        self.simulation_mode.load(Ordering::SeqCst)
    }

    pub fn feed(&self) -> &Arc<dyn RpcFeed> {
        &self.feed
    }
}
