use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::backend::FunctionError;
use crate::workflows::invites::{
    invite_router, InviteIssuer, InviteOrigin, OfflineIssuance, ServerIssuance,
};

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn issue_route_returns_created_code() {
    let store = seeded_store();
    let functions = Arc::new(ScriptedFunctions::replying(vec![Ok(json!({
        "success": true,
        "code": "SRV12345",
    }))]));
    let issuer = InviteIssuer::new(vec![Box::new(ServerIssuance::new(functions.clone()))]);
    let router = invite_router(Arc::new(service(&store, functions.clone(), issuer)));

    let response = router
        .oneshot(post("/api/v1/properties/p-1/invites", r#"{"expiresInDays": 2}"#))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["code"], "SRV12345");
    assert_eq!(body["origin"], "server");
    assert_eq!(body["joinUrl"], format!("{JOIN_BASE_URL}/join?code=SRV12345"));
    assert_eq!(body["originLabel"], "Server issued");
    assert_eq!(functions.calls()[0].1["expirationDays"], 2);
}

#[tokio::test]
async fn issue_route_defaults_expiration_when_body_is_empty() {
    let store = seeded_store();
    let issuer = InviteIssuer::new(vec![Box::new(OfflineIssuance::new(Arc::new(store.clone())))]);
    let router = invite_router(Arc::new(service(
        &store,
        Arc::new(ScriptedFunctions::default()),
        issuer,
    )));

    let response = router
        .oneshot(post("/api/v1/properties/p-1/invites", ""))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let expires_at = body["expiresAt"]
        .as_str()
        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
        .expect("expiresAt timestamp");
    assert_eq!(expires_at, now() + Duration::days(7));
}

#[tokio::test]
async fn issue_route_maps_strict_failures_to_bad_gateway() {
    let store = seeded_store();
    let functions = Arc::new(ScriptedFunctions::replying(vec![Err(
        FunctionError::PermissionDenied("denied".into()),
    )]));
    let issuer = InviteIssuer::new(vec![Box::new(ServerIssuance::new(functions.clone()))]);
    let router = invite_router(Arc::new(service(&store, functions, issuer)));

    let response = router
        .oneshot(post("/api/v1/properties/p-1/invites", "{}"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn issue_route_rejects_lifetimes_beyond_a_year() {
    let store = seeded_store();
    let functions = Arc::new(ScriptedFunctions::default());
    let issuer = InviteIssuer::new(vec![
        Box::new(ServerIssuance::new(functions.clone())),
        Box::new(OfflineIssuance::new(Arc::new(store.clone()))),
    ]);
    let router = invite_router(Arc::new(service(&store, functions.clone(), issuer)));

    let response = router
        .oneshot(post(
            "/api/v1/properties/p-1/invites",
            r#"{"expiresInDays": 4294967295}"#,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fields"].to_string().contains("expires_in_days"));
    assert!(functions.calls().is_empty());
}

#[tokio::test]
async fn redeem_route_maps_outcomes() {
    let store = seeded_store();
    stored_invite(&store, "K7M2QXRA", now() + Duration::days(1), InviteOrigin::Server);
    let issuer = InviteIssuer::new(Vec::new());
    let router = invite_router(Arc::new(service(
        &store,
        Arc::new(ScriptedFunctions::default()),
        issuer,
    )));

    let redeemed = router
        .clone()
        .oneshot(post("/api/v1/invites/K7M2QXRA/redeem", r#"{"tenantId": "t-1"}"#))
        .await
        .expect("response");
    assert_eq!(redeemed.status(), StatusCode::OK);
    let body = json_body(redeemed).await;
    assert_eq!(body["consumedBy"], "t-1");

    let again = router
        .clone()
        .oneshot(post("/api/v1/invites/K7M2QXRA/redeem", r#"{"tenantId": "t-1"}"#))
        .await
        .expect("response");
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let unknown = router
        .clone()
        .oneshot(post("/api/v1/invites/MISSING2/redeem", r#"{"tenantId": "t-1"}"#))
        .await
        .expect("response");
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let malformed = router
        .oneshot(post("/api/v1/invites/K7M2QXRA/redeem", "{}"))
        .await
        .expect("response");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}
