use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal_macros::dec;
use solbot_market_data::{
    Asset, FeedStatus, PriceFeed, PriceHistory, PriceQuote, RpcFeed, TokenMetadata,
    TokenMetadataFeed,
};
use solbot_resilience::{FamilyStats, FetchDiagnostics, Resolution, ResolvedFrom};
use solbot_server::{api::app_router, config::Config, AppState};
use tower::ServiceExt;

const WALLET: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xaB7YaB1pPB263";

fn resolved<T>(value: T, source: ResolvedFrom) -> Resolution<T> {
    Resolution {
        value,
        source,
        diagnostics: FetchDiagnostics::new(),
    }
}

/// Family behaviour shared by the fakes.
struct FakeFamily {
    name: &'static str,
    online: bool,
    total: usize,
    working: usize,
    resets: AtomicUsize,
}

impl FakeFamily {
    fn new(name: &'static str, online: bool, total: usize, working: usize) -> Self {
        Self {
            name,
            online,
            total,
            working,
            resets: AtomicUsize::new(0),
        }
    }

    fn stats(&self) -> FamilyStats {
        FamilyStats {
            family: self.name.to_string(),
            total_keys: self.total,
            working_keys: self.working,
            ..Default::default()
        }
    }
}

macro_rules! impl_feed_status {
    ($fake:ty) => {
        #[async_trait]
        impl FeedStatus for $fake {
            fn family(&self) -> &str {
                self.family.name
            }

            async fn check_status(&self) -> bool {
                self.family.online
            }

            fn get_last_error(&self) -> Option<String> {
                None
            }

            fn reset_state(&self) {
                self.family.resets.fetch_add(1, Ordering::SeqCst);
            }

            fn get_stats(&self) -> FamilyStats {
                self.family.stats()
            }
        }
    };
}

struct FakePrices {
    family: FakeFamily,
    delay: Duration,
}

impl_feed_status!(FakePrices);

#[async_trait]
impl PriceFeed for FakePrices {
    async fn get_current_price(&self, asset: Asset) -> Resolution<PriceQuote> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match asset {
            Asset::Sol => resolved(
                PriceQuote::new(dec!(172.35), dec!(2.5)),
                ResolvedFrom::Candidate("CG-abc...".to_string()),
            ),
            other => resolved(
                PriceQuote::new(other.last_resort_price(), dec!(0)),
                ResolvedFrom::LastResort,
            ),
        }
    }

    async fn get_historical_prices(&self, _asset: Asset, days: u32) -> Resolution<PriceHistory> {
        let count = days.min(7) as usize;
        resolved(
            PriceHistory {
                prices: vec![dec!(100); count],
                labels: (0..count).map(|i| format!("Day {i}")).collect(),
            },
            ResolvedFrom::Fallback("BINANCE".to_string()),
        )
    }
}

struct FakeRpc {
    family: FakeFamily,
    endpoint: Option<String>,
}

impl_feed_status!(FakeRpc);

#[async_trait]
impl RpcFeed for FakeRpc {
    async fn get_healthy_endpoint(&self) -> Option<String> {
        self.endpoint.clone()
    }

    async fn get_balance(&self, _address: &str) -> Option<u64> {
        self.endpoint.as_ref().map(|_| 1_500_000_000)
    }
}

struct FakeMetadata {
    family: FakeFamily,
}

impl_feed_status!(FakeMetadata);

#[async_trait]
impl TokenMetadataFeed for FakeMetadata {
    async fn get_token_metadata(&self, mint: &str) -> Resolution<TokenMetadata> {
        resolved(TokenMetadata::unknown(mint), ResolvedFrom::LastResort)
    }
}

struct Harness {
    router: Router,
    prices: Arc<FakePrices>,
    metadata: Option<Arc<FakeMetadata>>,
}

fn harness(rpc_endpoint: Option<&str>, with_metadata: bool) -> Harness {
    let prices = Arc::new(FakePrices {
        family: FakeFamily::new("price", true, 4, 1),
        delay: Duration::ZERO,
    });
    let rpc = Arc::new(FakeRpc {
        family: FakeFamily::new("rpc", rpc_endpoint.is_some(), 6, 6),
        endpoint: rpc_endpoint.map(str::to_string),
    });
    let metadata = with_metadata.then(|| {
        Arc::new(FakeMetadata {
            family: FakeFamily::new("metadata", true, 2, 2),
        })
    });

    let metadata_feed: Option<Arc<dyn TokenMetadataFeed>> = match &metadata {
        Some(feed) => Some(feed.clone()),
        None => None,
    };
    let state = Arc::new(AppState::new(prices.clone(), rpc, metadata_feed, 0.5));
    Harness {
        router: app_router(state, &Config::default()),
        prices,
        metadata,
    }
}

async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(router, Method::GET, uri).await
}

#[tokio::test]
async fn healthz_works() {
    let h = harness(None, false);
    let response = h
        .router
        .oneshot(Request::builder().uri("/api/v1/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn price_reports_source() {
    let h = harness(None, false);

    let (status, json) = get(&h.router, "/api/v1/price/SOL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price"].as_f64(), Some(172.35));
    assert_eq!(json["change24h"].as_f64(), Some(2.5));
    assert_eq!(json["source"], "CG-abc...");

    let (_, json) = get(&h.router, "/api/v1/price/bitcoin").await;
    assert_eq!(json["source"], "LAST_RESORT");
    assert_eq!(json["price"].as_f64(), Some(60000.0));
}

#[tokio::test]
async fn slow_request_times_out_with_408() {
    let prices = Arc::new(FakePrices {
        family: FakeFamily::new("price", true, 1, 1),
        delay: Duration::from_secs(30),
    });
    let rpc = Arc::new(FakeRpc {
        family: FakeFamily::new("rpc", false, 0, 0),
        endpoint: None,
    });
    let state = Arc::new(AppState::new(prices, rpc, None, 0.5));
    let config = Config {
        request_timeout: Duration::from_millis(50),
        ..Config::default()
    };
    let router = app_router(state, &config);

    let (status, _) = get(&router, "/api/v1/price/SOL").await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn unknown_asset_is_404() {
    let h = harness(None, false);
    let (status, json) = get(&h.router, "/api/v1/price/DOGE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], 404);
    assert!(json["message"].as_str().unwrap().contains("DOGE"));
}

#[tokio::test]
async fn history_defaults_and_validates_days() {
    let h = harness(None, false);

    let (status, json) = get(&h.router, "/api/v1/price/eth/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["prices"].as_array().unwrap().len(), 7);
    assert_eq!(json["labels"].as_array().unwrap().len(), 7);
    assert_eq!(json["source"], "BINANCE");

    let (status, json) = get(&h.router, "/api/v1/price/eth/history?days=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["prices"].as_array().unwrap().len(), 3);

    let (status, _) = get(&h.router, "/api/v1/price/eth/history?days=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rpc_without_endpoint_enters_simulation_mode() {
    let h = harness(None, false);

    let (status, json) = get(&h.router, "/api/v1/rpc/endpoint").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["endpoint"].is_null());
    assert_eq!(json["simulationMode"], true);

    let (status, json) = get(&h.router, &format!("/api/v1/rpc/balance/{WALLET}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["lamports"].is_null());
    assert_eq!(json["simulationMode"], true);
}

#[tokio::test]
async fn rpc_with_endpoint() {
    let h = harness(Some("https://rpc.example.com"), false);

    let (_, json) = get(&h.router, "/api/v1/rpc/endpoint").await;
    assert_eq!(json["endpoint"], "https://rpc.example.com");
    assert_eq!(json["simulationMode"], false);

    let (_, json) = get(&h.router, &format!("/api/v1/rpc/balance/{WALLET}")).await;
    assert_eq!(json["lamports"], 1_500_000_000u64);
    assert_eq!(json["sol"].as_f64(), Some(1.5));
}

#[tokio::test]
async fn balance_rejects_bad_address() {
    let h = harness(Some("https://rpc.example.com"), false);
    let (status, json) = get(&h.router, "/api/v1/rpc/balance/not-an-address").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 400);
}

#[tokio::test]
async fn tokens_without_metadata_capability_is_501() {
    let h = harness(None, false);
    let (status, json) = get(&h.router, &format!("/api/v1/tokens/{BONK_MINT}")).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(json["code"], 501);
}

#[tokio::test]
async fn tokens_with_metadata_capability() {
    let h = harness(None, true);
    let (status, json) = get(&h.router, &format!("/api/v1/tokens/{BONK_MINT}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mint"], BONK_MINT);
    assert_eq!(json["symbol"], "UNKNOWN");
    assert_eq!(json["decimals"], 9);
    assert_eq!(json["source"], "LAST_RESORT");
}

#[tokio::test]
async fn status_flags_degraded_families() {
    let h = harness(None, true);
    let (status, json) = get(&h.router, "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);

    let families = json["families"].as_array().unwrap();
    assert_eq!(families.len(), 3);
    // One of four price keys working is under the 0.5 ratio
    assert_eq!(families[0]["family"], "price");
    assert_eq!(families[0]["online"], true);
    assert_eq!(families[0]["degraded"], true);
    assert_eq!(families[0]["stats"]["workingKeys"], 1);
    // No healthy RPC endpoint
    assert_eq!(families[1]["online"], false);
    assert_eq!(families[2]["degraded"], false);
    assert_eq!(json["degraded"], true);
}

#[tokio::test]
async fn reset_reaches_every_family() {
    let h = harness(Some("https://rpc.example.com"), true);

    let (status, _) = send(&h.router, Method::POST, "/api/v1/status/reset").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&h.router, Method::POST, "/api/v1/status/reset").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(h.prices.family.resets.load(Ordering::SeqCst), 2);
    let metadata = h.metadata.as_ref().unwrap();
    assert_eq!(metadata.family.resets.load(Ordering::SeqCst), 2);
}
