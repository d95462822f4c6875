//! Background refresh of the RPC connection.
//!
//! Keeps the dashboard's endpoint and simulation flag current without
//! waiting for a request to trigger a sweep.

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{debug, info};

use crate::main_lib::AppState;

/// Time between two endpoint sweeps.
const REFRESH_INTERVAL_SECS: u64 = 60;

pub fn start_rpc_refresh(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!("RPC refresh started ({}s interval)", REFRESH_INTERVAL_SECS);

        // First tick completes immediately
        let mut refresh_interval = interval(Duration::from_secs(REFRESH_INTERVAL_SECS));
        loop {
            refresh_interval.tick().await;
            let endpoint = state.rpc_connection.refresh().await;
            debug!(
                "RPC refresh: endpoint found = {}, simulation = {}",
                endpoint.is_some(),
                state.rpc_connection.is_simulation_mode()
            );
        }
    });
}
