//! Web server module.
//!
//! Binds the two core operations to their HTTP endpoints and maps the error
//! taxonomy onto status codes. Everything HTTP-shaped lives here; the stores
//! never see a request or a status code.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::auth::{self, AuthError};
use crate::config::AuthConfig;
use crate::storage::{
    ReportQuery, ReportRow, SaleRecord, SalesStore, StorageError, UserStore, ValidationError,
};

/// Page size used when the caller doesn't specify one.
const DEFAULT_PAGE_SIZE: i64 = 12;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sales: SalesStore,
    pub users: UserStore,
    pub auth: AuthConfig,
}

// =============================================================================
// Errors
// =============================================================================

/// Request-level failure, mapped to an HTTP response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
            ApiError::Auth(AuthError::Forbidden) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": AuthError::Forbidden.to_string() })),
            )
                .into_response(),
            ApiError::Auth(err) => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"tillsync\"")],
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
            ApiError::Storage(err) => {
                // Log the detail, return a generic body.
                tracing::error!(error = %err, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

// =============================================================================
// Request / response shapes
// =============================================================================

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
}

/// Body of `POST /sync-sales`.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub sales: Vec<SaleRecord>,
}

#[derive(Serialize)]
struct SyncResponse {
    status: &'static str,
    synced_count: usize,
}

/// Query parameters for `GET /sales/data`.
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub report_type: String,
    pub date: String,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Serialize)]
struct ReportResponse {
    report_type: String,
    date: String,
    sales: Vec<ReportRow>,
    total_sales: f64,
    total_items: u64,
    page: u32,
    page_size: u32,
    total_pages: u32,
}

// =============================================================================
// Router
// =============================================================================

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/sync-sales", post(sync_sales_handler))
        .route("/sales/data", get(sales_data_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        db: None,
    })
}

/// Readiness probe that checks database availability.
async fn readyz_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.sales.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "ok".to_string(),
            db: Some("ready".to_string()),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "not_ready".to_string(),
                    db: Some(err.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Ingestion endpoint: upsert a batch of sales.
///
/// When auth is enabled the caller must present Basic credentials for an
/// admin user; both checks happen before the batch is even validated, and
/// validation happens before any write.
async fn sync_sales_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    if state.auth.require_admin {
        let (username, password) = auth::basic_credentials(&headers)?;
        let identity = state
            .users
            .authenticate(&username, &password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !identity.is_admin() {
            tracing::warn!(username = %identity.username, "Sync rejected: not an admin");
            return Err(AuthError::Forbidden.into());
        }
        tracing::debug!(username = %identity.username, "Sync authorized");
    }

    let sales = request
        .sales
        .into_iter()
        .map(SaleRecord::normalize)
        .collect::<Result<Vec<_>, _>>()?;

    let receipt = state.sales.sync(&sales).await?;
    Ok(Json(SyncResponse {
        status: "success",
        synced_count: receipt.synced_count,
    }))
}

/// Reporting endpoint: aggregates plus one page of matching sales.
async fn sales_data_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ReportResponse>, ApiError> {
    let query = ReportQuery::new(
        &params.report_type,
        &params.date,
        params.page,
        params.page_size,
    )?;

    let page = state.sales.report(&query).await?;
    Ok(Json(ReportResponse {
        report_type: query.granularity().to_string(),
        date: params.date,
        sales: page.rows,
        total_sales: page.total_amount,
        total_items: page.total_count,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
    }))
}
