//! HTTP API for the Pricing Engine.
//!
//! This module exposes the calculator over a small JSON API built on
//! [`axum`](https://crates.io/crates/axum).  Every pricing route
//! resolves the calling account from a bearer token first; the
//! calculation itself is delegated to [`crate::calculator`] and
//! results are persisted through the injected [`PricingStore`].

use crate::auth::{bearer_token, Authenticator};
use crate::calculator::{calculate_pricing, calculate_scenarios, Scenario};
use crate::config::AppConfig;
use crate::display::Currency;
use crate::error::PricingError;
use crate::models::{CostInputs, PricingConfig, PricingRecord, PricingResult, PricingSnapshot};
use crate::store::{InMemoryStore, JsonFileStore, PricingStore};
use crate::validation::{validate_config, validate_costs};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Most margins accepted in one scenario comparison.
pub const MAX_SCENARIOS: usize = 50;

/// Application state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PricingStore>,
    pub auth: Arc<dyn Authenticator>,
    pub default_currency: Currency,
}

/// A [`PricingError`] rendered as `{"error": "..."}` with a matching status.
pub struct ApiError(PricingError);

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PricingError::InvalidConfig { .. } => StatusCode::BAD_REQUEST,
            PricingError::InvalidCost { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PricingError::Unauthorized => StatusCode::UNAUTHORIZED,
            PricingError::NotFound(_) => StatusCode::NOT_FOUND,
            PricingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, %status, "request rejected");
        }
        let body = Json(serde_json::json!({"error": self.0.to_string()}));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub costs: CostInputs,
    #[serde(default)]
    pub config: PricingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRequest {
    pub costs: CostInputs,
    #[serde(default)]
    pub config: PricingConfig,
    pub margins: Vec<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    pub amount: Decimal,
    pub currency: Option<Currency>,
}

#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub formatted: String,
    pub currency: &'static str,
    pub locale: &'static str,
}

/// Build the API router around the given collaborators.
pub fn build_router(
    store: Arc<dyn PricingStore>,
    auth: Arc<dyn Authenticator>,
    default_currency: Currency,
) -> Router {
    let state = AppState {
        store,
        auth,
        default_currency,
    };
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/pricing/calculate", post(calculate_handler))
        .route("/api/pricing/scenarios", post(scenarios_handler))
        .route(
            "/api/pricing/snapshot",
            get(get_snapshot_handler).put(put_snapshot_handler),
        )
        .route("/api/pricing/history", get(history_handler))
        .route("/api/pricing/format", post(format_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<String> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(PricingError::Unauthorized)?;
    Ok(state.auth.authenticate(token)?)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Handler for POST /api/pricing/calculate
async fn calculate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CalculateRequest>,
) -> ApiResult<Json<PricingResult>> {
    let account = authenticate(&state, &headers)?;
    let result = calculate_pricing(&request.costs, &request.config)?.rounded();
    let record = PricingRecord {
        costs: request.costs,
        config: request.config,
        result: result.clone(),
        calculated_at: Utc::now(),
    };
    state.store.append_record(&account, record).await?;
    tracing::info!(%account, price = %result.suggested_service_price, "pricing calculated");
    Ok(Json(result))
}

/// Handler for POST /api/pricing/scenarios
async fn scenarios_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ScenarioRequest>,
) -> ApiResult<Json<Vec<Scenario>>> {
    authenticate(&state, &headers)?;
    if request.margins.is_empty() || request.margins.len() > MAX_SCENARIOS {
        return Err(PricingError::InvalidConfig {
            field: "margins",
            reason: format!("must contain between 1 and {} entries", MAX_SCENARIOS),
        }
        .into());
    }
    let costs = request.costs;
    let config = request.config;
    let margins = request.margins;
    // The comparison is CPU-bound; keep it off the async workers.
    let scenarios = tokio::task::spawn_blocking(move || {
        calculate_scenarios(&costs, &config, &margins)
    })
    .await
    .map_err(|err| PricingError::Storage(format!("scenario task failed: {}", err)))??;
    let rounded = scenarios
        .into_iter()
        .map(|scenario| Scenario {
            result: scenario.result.rounded(),
            ..scenario
        })
        .collect();
    Ok(Json(rounded))
}

/// Handler for GET /api/pricing/snapshot
async fn get_snapshot_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<PricingSnapshot>> {
    let account = authenticate(&state, &headers)?;
    let snapshot = state
        .store
        .load_snapshot(&account)
        .await?
        .ok_or_else(|| PricingError::NotFound("pricing snapshot".to_string()))?;
    Ok(Json(snapshot))
}

/// Handler for PUT /api/pricing/snapshot
async fn put_snapshot_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CalculateRequest>,
) -> ApiResult<Json<PricingSnapshot>> {
    let account = authenticate(&state, &headers)?;
    validate_costs(&request.costs)?;
    validate_config(&request.config)?;
    let snapshot = PricingSnapshot {
        costs: request.costs,
        config: request.config,
        updated_at: Utc::now(),
    };
    state.store.save_snapshot(&account, snapshot.clone()).await?;
    tracing::info!(%account, "pricing snapshot saved");
    Ok(Json(snapshot))
}

/// Handler for GET /api/pricing/history
async fn history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<PricingRecord>>> {
    let account = authenticate(&state, &headers)?;
    let records = state.store.history(&account, params.limit).await?;
    Ok(Json(records))
}

/// Handler for POST /api/pricing/format
async fn format_handler(
    State(state): State<AppState>,
    Json(request): Json<FormatRequest>,
) -> Json<FormatResponse> {
    let currency = request.currency.unwrap_or(state.default_currency);
    Json(FormatResponse {
        formatted: currency.format_amount(request.amount),
        currency: currency.code(),
        locale: currency.locale(),
    })
}

/// Launch the API server.  Builds the store and authenticator from the
/// configuration, binds to the configured address and blocks until the
/// server terminates.
pub async fn serve(config: AppConfig) -> Result<()> {
    let store: Arc<dyn PricingStore> = match &config.data_dir {
        Some(dir) => Arc::new(
            JsonFileStore::open(dir)
                .await
                .with_context(|| format!("opening data directory {}", dir.display()))?
                .with_history_limit(config.history_limit),
        ),
        None => {
            tracing::warn!("PRICING_DATA_DIR not set, pricing data will not survive restarts");
            Arc::new(InMemoryStore::with_history_limit(config.history_limit))
        }
    };
    if config.api_tokens.is_empty() {
        tracing::warn!("no API tokens configured, every pricing request will be rejected");
    }
    let router = build_router(
        store,
        Arc::new(config.api_tokens.clone()),
        config.default_currency,
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        currency = config.default_currency.code(),
        history_limit = config.history_limit,
        "server listening"
    );
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenAuthenticator;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        let auth = StaticTokenAuthenticator::parse("secret=salon-1,other=salon-2").unwrap();
        build_router(Arc::new(InMemoryStore::new()), Arc::new(auth), Currency::Brl)
    }

    fn salon_body() -> Value {
        json!({
            "costs": {
                "rentCost": 2000,
                "employeeCount": 2,
                "averageSalary": 3000,
                "utilitiesCost": 500,
                "insuranceCost": 300,
                "maintenanceCost": 200,
                "marketingCost": 400,
                "materialsCost": 1000,
                "softwareLicenses": 200,
                "otherCosts": 100
            },
            "config": {
                "desiredProfitMargin": 30,
                "workingDaysPerMonth": 22,
                "workingHoursPerDay": 8,
                "averageServiceDuration": 60
            }
        })
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn assert_number(value: &Value, expected: f64) {
        let actual = value.as_f64().unwrap_or(f64::NAN);
        assert!((actual - expected).abs() < 1e-9, "{value} != {expected}");
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn calculate_requires_token() {
        let app = router();
        let (status, body) = send(
            &app,
            request("POST", "/api/pricing/calculate", None, Some(salon_body())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = send(
            &app,
            request("POST", "/api/pricing/calculate", Some("wrong"), Some(salon_body())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn calculate_returns_rounded_result_and_records_history() {
        let app = router();
        let (status, body) = send(
            &app,
            request("POST", "/api/pricing/calculate", Some("secret"), Some(salon_body())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_number(&body["totalMonthlyCost"], 10700.0);
        assert_number(&body["costPerHour"], 60.8);
        assert_number(&body["suggestedServicePrice"], 79.03);
        assert_eq!(body["servicesPerMonth"], json!(176));
        assert_number(&body["costBreakdown"]["personnel"], 6000.0);

        let (status, history) = send(
            &app,
            request("GET", "/api/pricing/history?limit=5", Some("secret"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);

        let (_, other) = send(&app, request("GET", "/api/pricing/history", Some("other"), None)).await;
        assert!(other.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_bad_request() {
        let app = router();
        let mut body = salon_body();
        body["config"]["workingDaysPerMonth"] = json!(0);
        let (status, body) = send(
            &app,
            request("POST", "/api/pricing/calculate", Some("secret"), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("workingDaysPerMonth"));
    }

    #[tokio::test]
    async fn tiny_service_duration_is_bad_request() {
        let app = router();
        let mut body = salon_body();
        body["config"]["averageServiceDuration"] = json!(1e-27);
        let (status, body) = send(
            &app,
            request("POST", "/api/pricing/calculate", Some("secret"), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("averageServiceDuration"));
    }

    #[tokio::test]
    async fn negative_cost_is_unprocessable() {
        let app = router();
        let mut body = salon_body();
        body["costs"]["rentCost"] = json!(-1);
        let (status, _) = send(
            &app,
            request("POST", "/api/pricing/calculate", Some("secret"), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn snapshot_round_trip() {
        let app = router();
        let (status, _) = send(&app, request("GET", "/api/pricing/snapshot", Some("secret"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            request("PUT", "/api/pricing/snapshot", Some("secret"), Some(salon_body())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, snapshot) =
            send(&app, request("GET", "/api/pricing/snapshot", Some("secret"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["costs"]["employeeCount"], json!(2));
        assert_eq!(snapshot["config"]["workingDaysPerMonth"], json!(22));
    }

    #[tokio::test]
    async fn scenarios_compare_margins() {
        let app = router();
        let mut body = salon_body();
        body["margins"] = json!([0, 30, 50]);
        let (status, scenarios) = send(
            &app,
            request("POST", "/api/pricing/scenarios", Some("secret"), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let scenarios = scenarios.as_array().unwrap();
        assert_eq!(scenarios.len(), 3);
        assert_number(&scenarios[0]["result"]["suggestedServicePrice"], 60.8);
        assert_number(&scenarios[1]["result"]["suggestedServicePrice"], 79.03);
    }

    #[tokio::test]
    async fn scenarios_require_margins() {
        let app = router();
        let mut body = salon_body();
        body["margins"] = json!([]);
        let (status, _) = send(
            &app,
            request("POST", "/api/pricing/scenarios", Some("secret"), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn format_uses_currency_conventions() {
        let app = router();
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/pricing/format",
                None,
                Some(json!({"amount": 1234.5, "currency": "EUR"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["formatted"], json!("1.234,50 €"));
        assert_eq!(body["currency"], json!("EUR"));
        assert_eq!(body["locale"], json!("es-ES"));

        let (status, body) = send(
            &app,
            request("POST", "/api/pricing/format", None, Some(json!({"amount": 79.03}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["formatted"], json!("R$ 79,03"));
        assert_eq!(body["currency"], json!("BRL"));
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = send(&router(), request("GET", "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
    }
}
