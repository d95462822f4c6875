use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solbot_market_data::{Asset, FeedStatus, PriceHistory, PriceQuote, TokenMetadata};
use solbot_resilience::FamilyStats;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

const DEFAULT_HISTORY_DAYS: u32 = 7;
const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[derive(Serialize)]
struct PriceResponse {
    #[serde(flatten)]
    quote: PriceQuote,
    source: String,
}

#[derive(Serialize)]
struct HistoryResponse {
    #[serde(flatten)]
    history: PriceHistory,
    source: String,
}

#[derive(Deserialize)]
struct HistoryQuery {
    days: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointResponse {
    endpoint: Option<String>,
    simulation_mode: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    address: String,
    lamports: Option<u64>,
    sol: Option<Decimal>,
    simulation_mode: bool,
}

#[derive(Serialize)]
struct TokenResponse {
    #[serde(flatten)]
    metadata: TokenMetadata,
    source: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FamilyStatus {
    family: String,
    online: bool,
    degraded: bool,
    stats: FamilyStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    families: Vec<FamilyStatus>,
    /// Whether the UI should show its warning banner.
    degraded: bool,
}

pub async fn healthz() -> &'static str {
    "ok"
}

async fn get_price(
    State(state): State<Arc<AppState>>,
    Path(asset): Path<String>,
) -> ApiResult<Json<PriceResponse>> {
    let asset: Asset = asset.parse()?;
    let resolution = state.price_feed.get_current_price(asset).await;
    Ok(Json(PriceResponse {
        source: resolution.source.to_string(),
        quote: resolution.value,
    }))
}

async fn get_price_history(
    State(state): State<Arc<AppState>>,
    Path(asset): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let asset: Asset = asset.parse()?;
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if days == 0 {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }

    let resolution = state.price_feed.get_historical_prices(asset, days).await;
    Ok(Json(HistoryResponse {
        source: resolution.source.to_string(),
        history: resolution.value,
    }))
}

async fn get_rpc_endpoint(State(state): State<Arc<AppState>>) -> Json<EndpointResponse> {
    let endpoint = state.rpc_connection.refresh().await;
    Json(EndpointResponse {
        endpoint,
        simulation_mode: state.rpc_connection.is_simulation_mode(),
    })
}

/// Base58 with the length of an ed25519 public key.
fn is_plausible_address(address: &str) -> bool {
    (32..=44).contains(&address.len())
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
}

async fn get_rpc_balance(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> ApiResult<Json<BalanceResponse>> {
    if !is_plausible_address(&address) {
        return Err(ApiError::BadRequest(format!("invalid address '{address}'")));
    }

    let lamports = state.rpc_feed.get_balance(&address).await;
    Ok(Json(BalanceResponse {
        sol: lamports.map(|l| Decimal::from(l) / Decimal::from(LAMPORTS_PER_SOL)),
        lamports,
        simulation_mode: state.rpc_connection.is_simulation_mode(),
        address,
    }))
}

async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(mint): Path<String>,
) -> ApiResult<Json<TokenResponse>> {
    let Some(feed) = &state.metadata_feed else {
        return Err(ApiError::NotImplemented(
            "token metadata is not configured".to_string(),
        ));
    };
    if !is_plausible_address(&mint) {
        return Err(ApiError::BadRequest(format!("invalid mint '{mint}'")));
    }

    let resolution = feed.get_token_metadata(&mint).await;
    Ok(Json(TokenResponse {
        source: resolution.source.to_string(),
        metadata: resolution.value,
    }))
}

async fn family_status<F: FeedStatus + ?Sized>(feed: &F, degraded_ratio: f64) -> FamilyStatus {
    let online = feed.check_status().await;
    let stats = feed.get_stats();
    let degraded = !online || (stats.total_keys > 0 && stats.is_degraded(degraded_ratio));
    FamilyStatus {
        family: feed.family().to_string(),
        online,
        degraded,
        stats,
    }
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let ratio = state.degraded_ratio;
    let (price, rpc, metadata) = tokio::join!(
        family_status(&*state.price_feed, ratio),
        family_status(&*state.rpc_feed, ratio),
        async {
            match &state.metadata_feed {
                Some(feed) => Some(family_status(&**feed, ratio).await),
                None => None,
            }
        }
    );

    let mut families = vec![price, rpc];
    families.extend(metadata);
    let degraded = families.iter().any(|f| f.degraded);
    Json(StatusResponse { families, degraded })
}

async fn reset_status(State(state): State<Arc<AppState>>) -> StatusCode {
    state.price_feed.reset_state();
    state.rpc_feed.reset_state();
    if let Some(feed) = &state.metadata_feed {
        feed.reset_state();
    }
    tracing::info!("All source families reset");
    StatusCode::NO_CONTENT
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/price/{asset}", get(get_price))
        .route("/price/{asset}/history", get(get_price_history))
        .route("/rpc/endpoint", get(get_rpc_endpoint))
        .route("/rpc/balance/{address}", get(get_rpc_balance))
        .route("/tokens/{mint}", get(get_token))
        .route("/status", get(get_status))
        .route("/status/reset", post(reset_status));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}
