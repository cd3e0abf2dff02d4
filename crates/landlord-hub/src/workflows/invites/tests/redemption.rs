use super::common::*;
use chrono::Duration;
use serde_json::json;
use std::sync::Arc;

use crate::backend::{collections, DocumentStore};
use crate::workflows::contractors::RelationshipError;
use crate::workflows::invites::{
    DemoIssuance, InviteCode, InviteError, InviteIssuer, InviteOrigin, InviteRequest,
    OfflineIssuance,
};

fn offline_service(store: &crate::backend::InMemoryDocumentStore) -> crate::workflows::invites::InviteService {
    let issuer = InviteIssuer::new(vec![Box::new(OfflineIssuance::new(Arc::new(store.clone())))]);
    service(store, Arc::new(ScriptedFunctions::default()), issuer)
}

#[test]
fn issued_codes_carry_a_join_url() {
    let store = seeded_store();
    let service = offline_service(&store);

    let issued = service.issue(&InviteRequest::new("p-1")).expect("issued");
    assert_eq!(
        issued.join_url,
        format!("{JOIN_BASE_URL}/join?code={}", issued.invite.code)
    );
    assert_eq!(issued.origin_label, "Issued offline");

    let regenerated = service.regenerate(&InviteRequest::new("p-1")).expect("regenerated");
    assert_ne!(regenerated.invite.code, issued.invite.code);
    assert_eq!(store.len(collections::INVITE_CODES), 2);
}

#[test]
fn redeeming_links_tenant_and_consumes_code() {
    let store = seeded_store();
    stored_invite(&store, "K7M2QXRA", now() + Duration::days(6), InviteOrigin::Server);
    let service = offline_service(&store);

    let invite = service.redeem("K7M2QXRA", "t-1").expect("redeemed");
    assert_eq!(invite.consumed_by.as_deref(), Some("t-1"));
    assert_eq!(invite.consumed_at, Some(now()));

    let property = store
        .get(collections::PROPERTIES, "p-1")
        .expect("read")
        .expect("property");
    assert_eq!(property.data["tenantIds"], json!(["t-1"]));
    let tenant = store.get(collections::USERS, "t-1").expect("read").expect("tenant");
    assert_eq!(tenant.data["propertyIds"], json!(["p-1"]));

    let error = service
        .redeem("K7M2QXRA", "t-1")
        .expect_err("second redemption");
    assert!(matches!(error, InviteError::AlreadyRedeemed(_)));
}

#[test]
fn expired_unknown_and_demo_codes_are_rejected() {
    let store = seeded_store();
    stored_invite(&store, "OLDCODE2", now() - Duration::minutes(1), InviteOrigin::Offline);
    let service = offline_service(&store);

    assert!(matches!(
        service.redeem("OLDCODE2", "t-1"),
        Err(InviteError::Expired(_))
    ));
    assert!(matches!(
        service.redeem("NOPE2345", "t-1"),
        Err(InviteError::UnknownCode(_))
    ));

    let demo = DemoIssuance;
    let demo_invite = crate::workflows::invites::IssuanceStrategy::issue(
        &demo,
        &InviteRequest::new("p-1"),
        now(),
    )
    .expect("demo code");
    assert!(matches!(
        service.redeem(&demo_invite.code, "t-1"),
        Err(InviteError::DemoCode)
    ));

    let property = store
        .get(collections::PROPERTIES, "p-1")
        .expect("read")
        .expect("property");
    assert!(property.data.get("tenantIds").is_none());
}

#[test]
fn missing_tenant_profile_leaves_code_unused() {
    let store = seeded_store();
    stored_invite(&store, "K7M2QXRA", now() + Duration::days(6), InviteOrigin::Server);
    let service = offline_service(&store);

    let error = service
        .redeem("K7M2QXRA", "t-unknown")
        .expect_err("tenant missing");
    assert!(matches!(
        error,
        InviteError::Relationship(RelationshipError::NotFound { entity: "tenant", .. })
    ));

    let stored = store
        .get(collections::INVITE_CODES, "K7M2QXRA")
        .expect("read")
        .expect("invite");
    assert!(stored.data.get("consumedBy").is_none());
}

#[test]
fn failed_link_releases_the_code() {
    let store = seeded_store();
    stored_invite(&store, "K7M2QXRA", now() + Duration::days(6), InviteOrigin::Server);
    let service = offline_service(&store);

    service
        .redeem("K7M2QXRA", "t-unknown")
        .expect_err("tenant missing");
    let invite = service
        .redeem("K7M2QXRA", "t-1")
        .expect("code is still redeemable");
    assert_eq!(invite.consumed_by.as_deref(), Some("t-1"));
}

#[test]
fn racing_tenants_redeem_a_code_once() {
    let store = seeded_store();
    let tenants: Vec<String> = (1..=8).map(|n| format!("t-race-{n}")).collect();
    for tenant in &tenants {
        store
            .set(collections::USERS, tenant, json!({ "role": "tenant" }))
            .expect("seed tenant");
    }
    stored_invite(&store, "K7M2QXRA", now() + Duration::days(6), InviteOrigin::Server);
    let service = Arc::new(offline_service(&store));

    let workers: Vec<_> = tenants
        .iter()
        .cloned()
        .map(|tenant| {
            let service = service.clone();
            std::thread::spawn(move || service.redeem("K7M2QXRA", &tenant))
        })
        .collect();
    let outcomes: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().expect("worker"))
        .collect();

    let winners: Vec<&InviteCode> = outcomes.iter().filter_map(|outcome| outcome.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err())
        .all(|error| matches!(error, InviteError::AlreadyRedeemed(_))));

    let property = store
        .get(collections::PROPERTIES, "p-1")
        .expect("read")
        .expect("property");
    assert_eq!(property.data["tenantIds"], json!([winners[0].consumed_by]));
}
