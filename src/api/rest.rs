// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/` and are public.
//
//   GET  /health              service status + provider quota usage
//   POST /analyze             analyse a caller-supplied price history
//   POST /stock-data          fetch a snapshot from the market data provider
//   GET  /analysis/:symbol    fetch + analyse in one call
//
// Every error body is `{"error": "<message>"}`.  Computation and provider
// failures return a generic message; the detail goes to the log only.
//
// CORS allows any origin with the browser client's method/header set.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::{analyze, analyze_request, AnalysisError, AnalysisRequest, AnalysisResult};
use crate::app_state::AppState;
use crate::market_data::{FetchError, RateLimitSnapshot, StockSnapshot};

const FETCH_FAILURE: &str = "Failed to fetch stock data";

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS/trace middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-amz-date"),
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-amz-security-token"),
        ]);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze", post(analyze_handler))
        .route("/api/v1/stock-data", post(stock_data))
        .route("/api/v1/analysis/:symbol", get(analysis_for_symbol))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    /// Unparseable or incomplete request body.
    BadRequest(String),
    Analysis(AnalysisError),
    Fetch(FetchError),
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self::Analysis(e)
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

fn error_body(message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": message }))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                warn!(error = %msg, "rejected request body");
                (StatusCode::BAD_REQUEST, error_body(&msg)).into_response()
            }
            ApiError::Analysis(e @ AnalysisError::Validation(_)) => {
                warn!(error = %e, "analysis input rejected");
                (StatusCode::BAD_REQUEST, error_body(e.public_message())).into_response()
            }
            ApiError::Analysis(e @ AnalysisError::Computation(_)) => {
                error!(error = %e, "analysis failed");
                (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.public_message())).into_response()
            }
            ApiError::Fetch(e @ (FetchError::MissingSymbol | FetchError::InvalidSymbol(_))) => {
                warn!(error = %e, "symbol rejected");
                (StatusCode::BAD_REQUEST, error_body(&e.to_string())).into_response()
            }
            ApiError::Fetch(FetchError::RateLimited { endpoint, retry_after }) => {
                // Whole seconds, rounded up.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                warn!(endpoint = %endpoint, retry_after_secs = secs, "provider quota exhausted");
                let body = serde_json::json!({
                    "error": "Rate limit exceeded, try again later",
                    "retryAfterSecs": secs,
                });
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, secs.to_string())],
                    Json(body),
                )
                    .into_response()
            }
            ApiError::Fetch(e) => {
                error!(error = %e, "market data fetch failed");
                (StatusCode::BAD_GATEWAY, error_body(FETCH_FAILURE)).into_response()
            }
        }
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    analyses_served: u64,
    api_key_configured: bool,
    uptime_secs: u64,
    rate_limit: RateLimitSnapshot,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        analyses_served: state.analyses_served(),
        api_key_configured: state.client.has_api_key(),
        uptime_secs: state.uptime_secs(),
        rate_limit: state.rate_limiter.snapshot(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Analyze (caller-supplied data)
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody {
    #[serde(default)]
    stock_data: Option<AnalysisRequest>,
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", %request_id);

    async move {
        let Json(body) = body?;
        let request = body
            .stock_data
            .ok_or_else(|| ApiError::BadRequest("Stock data is required".to_string()))?;

        let mut jitter = state.jitter();
        let result = analyze_request(&request, &mut jitter)?;
        let served = state.record_analysis();

        info!(
            signal = %result.signal.current_signal,
            confidence = %result.confidence.confidence,
            success_probability = result.confidence.success_probability,
            risk_score = result.confidence.risk_score,
            analyses_served = served,
            "analysis complete"
        );
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(span)
    .await
}

// =============================================================================
// Stock data (provider fetch)
// =============================================================================

#[derive(Deserialize)]
struct StockDataBody {
    #[serde(default)]
    symbol: Option<String>,
}

async fn stock_data(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StockDataBody>, JsonRejection>,
) -> Result<Json<StockSnapshot>, ApiError> {
    let request_id = Uuid::new_v4();
    let Json(body) = body?;
    let symbol = body.symbol.unwrap_or_default();

    let snapshot = state
        .client
        .fetch_stock_data(&symbol)
        .instrument(info_span!("stock_data", %request_id))
        .await?;
    Ok(Json(snapshot))
}

// =============================================================================
// Fetch + analyse
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SymbolAnalysis {
    stock_data: StockSnapshot,
    analysis: AnalysisResult,
}

async fn analysis_for_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<SymbolAnalysis>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("analysis_for_symbol", %request_id, symbol = %symbol);

    async move {
        let stock_data = state.client.fetch_stock_data(&symbol).await?;

        let mut jitter = state.jitter();
        let analysis = analyze(
            &stock_data.candlestick_data,
            &stock_data.historical_prices,
            stock_data.current_price,
            &mut jitter,
        )?;
        let served = state.record_analysis();

        info!(
            symbol = %stock_data.symbol,
            signal = %analysis.signal.current_signal,
            confidence = %analysis.confidence.confidence,
            analyses_served = served,
            "analysis complete"
        );
        Ok::<_, ApiError>(Json(SymbolAnalysis { stock_data, analysis }))
    }
    .instrument(span)
    .await
}
