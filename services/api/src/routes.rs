use crate::infra::{parse_instant, ApiServices, AppState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use landlord_hub::error::AppError;
use landlord_hub::workflows::dashboard::DashboardSummary;
use landlord_hub::workflows::invites::invite_router;
use landlord_hub::workflows::maintenance::{
    interpret, is_overdue, BulkOperation, BulkOutcome, MaintenanceImporter, MaintenanceRequest,
    RequestFilter, RequestStatistics, TriageDecision,
};
use landlord_hub::workflows::onboarding::{assess_document, PropertyCompleteness};
use landlord_hub::workflows::validation::ValidationErrors;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Cursor;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StatisticsRequest {
    pub(crate) requests: Vec<MaintenanceRequest>,
    /// Ticket export in CSV form, used instead of `requests` when present.
    pub(crate) csv: Option<String>,
    pub(crate) now: Option<String>,
    pub(crate) filter: RequestFilter,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatisticsResponse {
    pub(crate) now: DateTime<Utc>,
    pub(crate) statistics: RequestStatistics,
    pub(crate) open: usize,
    pub(crate) completion_rate: f32,
    pub(crate) matched_ids: Vec<String>,
    pub(crate) overdue_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TriageRequest {
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) photo_urls: Vec<String>,
    /// Raw analysis text from an external model; skips the built-in analyst.
    #[serde(default)]
    pub(crate) analysis: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TriageResponse {
    pub(crate) decision: TriageDecision,
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkRequest {
    pub(crate) request_ids: Vec<String>,
    pub(crate) operation: BulkOperation,
}

pub(crate) fn with_api_routes(services: &ApiServices) -> axum::Router {
    invite_router(services.invites.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/properties/completeness",
            axum::routing::post(completeness_endpoint),
        )
        .route(
            "/api/v1/maintenance/statistics",
            axum::routing::post(statistics_endpoint),
        )
        .route(
            "/api/v1/maintenance/triage",
            axum::routing::post(triage_endpoint),
        )
        .route(
            "/api/v1/maintenance/bulk",
            axum::routing::post(bulk_endpoint),
        )
        .route(
            "/api/v1/dashboard/:landlord_id",
            axum::routing::get(dashboard_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn completeness_endpoint(
    Json(property): Json<Value>,
) -> Result<Json<PropertyCompleteness>, AppError> {
    if !property.is_object() {
        return Err(ValidationErrors::single("property", "must be a JSON object").into());
    }
    Ok(Json(assess_document(&property)))
}

pub(crate) async fn statistics_endpoint(
    Extension(services): Extension<ApiServices>,
    Json(payload): Json<StatisticsRequest>,
) -> Result<Json<StatisticsResponse>, AppError> {
    let StatisticsRequest {
        requests,
        csv,
        now,
        filter,
    } = payload;

    let requests = match csv {
        Some(csv) => MaintenanceImporter::from_reader(Cursor::new(csv.into_bytes()))?,
        None => requests,
    };
    let now = match now {
        Some(raw) => parse_instant(&raw)
            .map_err(|message| ValidationErrors::single("now", message))?,
        None => services.clock.now(),
    };

    let policy = services.policy;
    let matched: Vec<MaintenanceRequest> = filter
        .apply(&requests, now, &policy)
        .into_iter()
        .cloned()
        .collect();
    let statistics = RequestStatistics::compute(&matched, now, &policy);
    let overdue_ids = matched
        .iter()
        .filter(|request| is_overdue(request, now, &policy))
        .map(|request| request.id.clone())
        .collect();

    Ok(Json(StatisticsResponse {
        now,
        open: statistics.open(),
        completion_rate: statistics.completion_rate(),
        statistics,
        matched_ids: matched.into_iter().map(|request| request.id).collect(),
        overdue_ids,
    }))
}

pub(crate) async fn triage_endpoint(
    Extension(services): Extension<ApiServices>,
    Json(payload): Json<TriageRequest>,
) -> Result<Json<TriageResponse>, AppError> {
    let decision = match payload.analysis {
        Some(analysis) => interpret(&analysis)?,
        None => {
            if payload.description.trim().is_empty() {
                return Err(ValidationErrors::single("description", "is required").into());
            }
            services
                .triage
                .triage(&payload.description, &payload.photo_urls)?
        }
    };

    Ok(Json(TriageResponse {
        message: decision.message().to_string(),
        decision,
    }))
}

pub(crate) async fn bulk_endpoint(
    Extension(services): Extension<ApiServices>,
    Json(payload): Json<BulkRequest>,
) -> Result<Json<BulkOutcome>, AppError> {
    let outcome = services
        .bulk
        .dispatch(&payload.request_ids, &payload.operation)?;
    Ok(Json(outcome))
}

pub(crate) async fn dashboard_endpoint(
    Extension(services): Extension<ApiServices>,
    Path(landlord_id): Path<String>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(services.dashboard.summary(&landlord_id)?))
}
