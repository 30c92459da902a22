// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and return JSON.  There is no
// authentication: every route is read-only and serves public market data.
//
// CORS is permissive so a browser dashboard on another origin can call in.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::dashboard::{
    build_comparison, build_panel, ComparisonEntry, IndicatorPanel, PanelError, PanelSettings,
    SettingsOverrides,
};
use crate::kraken::SUPPORTED_INTERVALS;
use crate::types::Asset;

/// Shown when the exchange could not be reached or answered with an error.
const SERVICE_FAILURE_MESSAGE: &str = "Error in API response. Please try again.";

type ApiError = (StatusCode, Json<serde_json::Value>);

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/assets", get(assets))
        .route("/api/v1/indicators", get(indicators))
        .route("/api/v1/compare", get(compare))
        .layer(cors)
        .with_state(state)
}

/// Map a panel failure onto an HTTP status and JSON body.
fn error_response(err: PanelError) -> ApiError {
    if err.is_caller_error() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": err.to_string() })),
        );
    }

    warn!(error = %err, "upstream failure while building panel");
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({
            "error": SERVICE_FAILURE_MESSAGE,
            "detail": err.to_string(),
        })),
    )
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    uptime_secs: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.uptime_secs(),
    })
}

// =============================================================================
// Assets
// =============================================================================

#[derive(Serialize)]
struct AssetsResponse {
    assets: Vec<Asset>,
    default_interval: u32,
    supported_intervals: &'static [u32],
}

async fn assets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(AssetsResponse {
        assets: state.config.assets.clone(),
        default_interval: state.config.interval,
        supported_intervals: SUPPORTED_INTERVALS,
    })
}

// =============================================================================
// Indicators (single asset)
// =============================================================================

// Settings overrides (`interval`, `window_k`, `smoothing_d`, `ma_window`)
// come from the same query string via a second `Query<SettingsOverrides>`.

#[derive(Debug, Deserialize)]
struct IndicatorQuery {
    /// Display name or pair symbol; defaults to the first configured asset.
    asset: Option<String>,
}

async fn indicators(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndicatorQuery>,
    Query(overrides): Query<SettingsOverrides>,
) -> Result<Json<IndicatorPanel>, ApiError> {
    let settings = PanelSettings::resolve(&state.config, overrides).map_err(error_response)?;

    let asset = match query.asset.as_deref() {
        Some(name) => state
            .config
            .find_asset(name)
            .ok_or_else(|| PanelError::UnknownAsset(name.to_string())),
        None => state
            .config
            .assets
            .first()
            .ok_or_else(|| PanelError::UnknownAsset(String::new())),
    }
    .map_err(error_response)?;

    info!(asset = %asset.name, pair = %asset.pair, interval = settings.interval, "indicator request");

    let panel = build_panel(state.fetcher.as_ref(), asset, settings)
        .await
        .map_err(error_response)?;
    Ok(Json(panel))
}

// =============================================================================
// Compare (several assets)
// =============================================================================

#[derive(Debug, Deserialize)]
struct CompareQuery {
    /// Comma-separated display names or pair symbols.
    assets: String,
}

#[derive(Serialize)]
struct CompareResponse {
    settings: PanelSettings,
    entries: Vec<ComparisonEntry>,
}

async fn compare(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompareQuery>,
    Query(overrides): Query<SettingsOverrides>,
) -> Result<Json<CompareResponse>, ApiError> {
    let settings = PanelSettings::resolve(&state.config, overrides).map_err(error_response)?;

    let mut selected: Vec<Asset> = Vec::new();
    for name in query.assets.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let asset = state
            .config
            .find_asset(name)
            .ok_or_else(|| error_response(PanelError::UnknownAsset(name.to_string())))?;
        if !selected.contains(asset) {
            selected.push(asset.clone());
        }
    }

    if selected.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "select at least one asset" })),
        ));
    }

    info!(count = selected.len(), interval = settings.interval, "comparison request");

    let entries = build_comparison(state.fetcher.as_ref(), &selected, settings).await;
    Ok(Json(CompareResponse { settings, entries }))
}
