//! HTTP API for usage reports and Prometheus metrics

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

use crate::aggregator::UsageAggregator;
use crate::classifier::Severity;
use crate::limits::{FreeTierLimits, FREE_TIER_LIMITS};
use crate::models::AllUsage;
use crate::observability::gather_text;

/// Header carrying the static API key
pub const API_KEY_HEADER: &str = "x-api-key";

const NOT_CONFIGURED_ERROR: &str = "OCI not configured";
const NOT_CONFIGURED_HINT: &str = "Please configure your OCI credentials in the .env file";
const STATUS_NOT_CONFIGURED: &str = "OCI credentials not configured";

/// Shared application state
pub struct AppState {
    /// `None` when no provider credentials are configured
    pub aggregator: Option<UsageAggregator>,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(aggregator: Option<UsageAggregator>, api_key: Option<String>) -> Self {
        Self {
            aggregator,
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }
}

/// Overall status reported by `/usage` and `/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Ok,
    Attention,
    Warning,
    Critical,
    NotConfigured,
    Error,
}

impl ReportStatus {
    /// Usage severity, if the report carries one
    pub fn severity(&self) -> Option<Severity> {
        match self {
            ReportStatus::Ok => Some(Severity::Ok),
            ReportStatus::Attention => Some(Severity::Attention),
            ReportStatus::Warning => Some(Severity::Warning),
            ReportStatus::Critical => Some(Severity::Critical),
            ReportStatus::NotConfigured | ReportStatus::Error => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Ok => "OK",
            ReportStatus::Attention => "ATTENTION",
            ReportStatus::Warning => "WARNING",
            ReportStatus::Critical => "CRITICAL",
            ReportStatus::NotConfigured => "NOT_CONFIGURED",
            ReportStatus::Error => "ERROR",
        }
    }
}

impl From<Severity> for ReportStatus {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Ok => ReportStatus::Ok,
            Severity::Attention => ReportStatus::Attention,
            Severity::Warning => ReportStatus::Warning,
            Severity::Critical => ReportStatus::Critical,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsResponse {
    pub free_tier_limits: FreeTierLimits,
    pub timestamp: String,
}

/// Full usage report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub status: ReportStatus,
    pub max_usage_percentage: i64,
    pub warnings: Vec<String>,
    pub timestamp: String,
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<AllUsage>,
    pub free_tier_limits: FreeTierLimits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UsageResponse {
    fn unavailable(status: ReportStatus, configured: bool, error: String) -> Self {
        Self {
            status,
            max_usage_percentage: 0,
            warnings: Vec::new(),
            timestamp: timestamp(),
            configured,
            usage: None,
            free_tier_limits: FREE_TIER_LIMITS,
            error: Some(error),
            message: None,
        }
    }
}

/// Condensed status report; zero percentage and empty warnings are omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_usage_percentage: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    fn unavailable(status: ReportStatus, message: String) -> Self {
        Self {
            status,
            max_usage_percentage: 0,
            warnings: Vec::new(),
            timestamp: timestamp(),
            message: Some(message),
        }
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// RFC 3339 UTC with second precision
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: timestamp(),
    })
}

async fn limits() -> impl IntoResponse {
    Json(LimitsResponse {
        free_tier_limits: FREE_TIER_LIMITS,
        timestamp: timestamp(),
    })
}

async fn usage(State(state): State<Arc<AppState>>) -> Response {
    let Some(aggregator) = &state.aggregator else {
        let mut body = UsageResponse::unavailable(
            ReportStatus::NotConfigured,
            false,
            NOT_CONFIGURED_ERROR.to_string(),
        );
        body.message = Some(NOT_CONFIGURED_HINT.to_string());
        return (StatusCode::OK, Json(body)).into_response();
    };

    match aggregator.snapshot().await {
        Ok(snapshot) => Json(UsageResponse {
            status: snapshot.summary.status.into(),
            max_usage_percentage: snapshot.summary.max_usage_percentage,
            warnings: snapshot.summary.warnings,
            timestamp: timestamp(),
            configured: true,
            usage: Some(snapshot.usage),
            free_tier_limits: FREE_TIER_LIMITS,
            error: None,
            message: None,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Usage collection failed");
            let body = UsageResponse::unavailable(ReportStatus::Error, true, e.to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Response {
    let Some(aggregator) = &state.aggregator else {
        let body = StatusResponse::unavailable(
            ReportStatus::NotConfigured,
            STATUS_NOT_CONFIGURED.to_string(),
        );
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    };

    match aggregator.snapshot().await {
        Ok(snapshot) => Json(StatusResponse {
            status: snapshot.summary.status.into(),
            max_usage_percentage: snapshot.summary.max_usage_percentage,
            warnings: snapshot.summary.warnings,
            timestamp: timestamp(),
            message: None,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Status collection failed");
            let body = StatusResponse::unavailable(ReportStatus::Error, e.to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    match gather_text() {
        Ok(text) => (
            StatusCode::OK,
            [("content-type", "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn keys_match(expected: &[u8], provided: &[u8]) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    expected
        .iter()
        .zip(provided)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Rejects requests without the configured `X-API-Key`
async fn require_api_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &state.api_key {
        let provided = headers
            .get(API_KEY_HEADER)
            .map(|value| value.as_bytes())
            .unwrap_or_default();

        if !keys_match(expected.as_bytes(), provided) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "unauthorized" })),
            )
                .into_response();
        }
    }

    next.run(request).await
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/limits", get(limits))
        .route("/usage", get(usage))
        .route("/status", get(status))
        .route("/metrics", get(metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route("/health", get(health))
        .with_state(state)
}

/// Start the API server, returning once `shutdown` resolves
pub async fn serve<F>(port: u16, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
