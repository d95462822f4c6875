use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use solbot_market_data::constants::{COINGECKO_KEYS_ENV, JUPITER_API_URLS_ENV, SOLANA_RPC_URLS_ENV};
use solbot_resilience::source_list_from_env;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub log_format: String,
    pub coingecko_api_keys: Vec<String>,
    /// Empty means the public mainnet endpoints.
    pub solana_rpc_urls: Vec<String>,
    /// Empty means the public Jupiter hosts.
    pub jupiter_api_urls: Vec<String>,
    pub birdeye_api_key: Option<String>,
    pub metadata_enabled: bool,
    /// Health ratio under which the status banner is shown.
    pub degraded_ratio: f64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_or("SOLBOT_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .context("Invalid SOLBOT_LISTEN_ADDR")?;
        let cors_allow = env_or("SOLBOT_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = env_or("SOLBOT_REQUEST_TIMEOUT_MS", "30000")
            .parse()
            .unwrap_or(30000);
        let degraded_ratio: f64 = env_or("SOLBOT_DEGRADED_RATIO", "0.5")
            .parse()
            .unwrap_or(0.5);
        let birdeye_api_key = std::env::var("BIRDEYE_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            log_format: env_or("SOLBOT_LOG_FORMAT", "text"),
            coingecko_api_keys: source_list_from_env(COINGECKO_KEYS_ENV),
            solana_rpc_urls: source_list_from_env(SOLANA_RPC_URLS_ENV),
            jupiter_api_urls: source_list_from_env(JUPITER_API_URLS_ENV),
            birdeye_api_key,
            metadata_enabled: !env_flag("SOLBOT_DISABLE_METADATA"),
            degraded_ratio: degraded_ratio.clamp(0.0, 1.0),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            log_format: "text".to_string(),
            coingecko_api_keys: Vec::new(),
            solana_rpc_urls: Vec::new(),
            jupiter_api_urls: Vec::new(),
            birdeye_api_key: None,
            metadata_enabled: true,
            degraded_ratio: 0.5,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
