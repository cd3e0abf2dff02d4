use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::InviteRequest;
use super::service::{InviteError, InviteService};
use crate::workflows::contractors::RelationshipError;

/// Router builder exposing invite issuance and redemption.
pub fn invite_router(service: Arc<InviteService>) -> Router {
    Router::new()
        .route(
            "/api/v1/properties/:property_id/invites",
            post(issue_handler),
        )
        .route("/api/v1/invites/:code/redeem", post(redeem_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IssueOptions {
    #[serde(alias = "expirationDays")]
    expires_in_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedeemBody {
    tenant_id: String,
}

pub(crate) async fn issue_handler(
    State(service): State<Arc<InviteService>>,
    Path(property_id): Path<String>,
    body: Bytes,
) -> Response {
    let options = if body.is_empty() {
        IssueOptions::default()
    } else {
        match serde_json::from_slice::<IssueOptions>(&body) {
            Ok(options) => options,
            Err(err) => return bad_json(err),
        }
    };

    let days = options
        .expires_in_days
        .unwrap_or_else(|| service.default_expiration_days());
    let request = InviteRequest::new(property_id).with_expiration_days(days);

    match service.issue(&request) {
        Ok(issued) => (StatusCode::CREATED, axum::Json(issued)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn redeem_handler(
    State(service): State<Arc<InviteService>>,
    Path(code): Path<String>,
    body: Bytes,
) -> Response {
    let body = match serde_json::from_slice::<RedeemBody>(&body) {
        Ok(body) => body,
        Err(err) => return bad_json(err),
    };

    match service.redeem(&code, &body.tenant_id) {
        Ok(invite) => (StatusCode::OK, axum::Json(invite)).into_response(),
        Err(error) => error_response(error),
    }
}

fn bad_json(err: serde_json::Error) -> Response {
    let payload = json!({ "error": format!("invalid request body: {err}") });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn error_response(error: InviteError) -> Response {
    let status = match &error {
        InviteError::Validation(errors) => {
            let payload = json!({
                "error": error.to_string(),
                "fields": errors.errors,
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
        InviteError::UnknownCode(_)
        | InviteError::Relationship(RelationshipError::NotFound { .. }) => StatusCode::NOT_FOUND,
        InviteError::DemoCode | InviteError::AlreadyRedeemed(_) => StatusCode::CONFLICT,
        InviteError::Expired(_) => StatusCode::GONE,
        InviteError::Issuance { .. } => StatusCode::BAD_GATEWAY,
        InviteError::NoStrategies
        | InviteError::Relationship(_)
        | InviteError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
