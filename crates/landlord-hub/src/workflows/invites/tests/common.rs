use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::backend::{
    collections, Backend, DocumentStore, FunctionError, FunctionInvoker, InMemoryDocumentStore,
    InMemoryObjectStorage,
};
use crate::clock::FixedClock;
use crate::workflows::invites::{
    InviteCode, InviteIssuer, InviteOrigin, InviteRequest, InviteService, IssuanceError,
    IssuanceStrategy,
};

pub(super) const JOIN_BASE_URL: &str = "https://app.example.test";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
        .single()
        .expect("valid now")
}

/// Function runtime that replays queued responses and records every call.
#[derive(Default)]
pub(super) struct ScriptedFunctions {
    responses: Mutex<VecDeque<Result<Value, FunctionError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedFunctions {
    pub(super) fn replying(responses: Vec<Result<Value, FunctionError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::default(),
        }
    }

    pub(super) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl FunctionInvoker for ScriptedFunctions {
    fn invoke(&self, name: &str, args: Value) -> Result<Value, FunctionError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((name.to_string(), args));
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(FunctionError::Unavailable("no scripted response".into())))
    }
}

/// Wraps a strategy and counts how often the chain invoked it.
pub(super) struct Counted {
    inner: Box<dyn IssuanceStrategy>,
    calls: Arc<AtomicUsize>,
}

impl Counted {
    pub(super) fn wrap(inner: impl IssuanceStrategy + 'static) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: Box::new(inner),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl IssuanceStrategy for Counted {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn issue(
        &self,
        request: &InviteRequest,
        now: DateTime<Utc>,
    ) -> Result<InviteCode, IssuanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.issue(request, now)
    }
}

pub(super) fn count(calls: &Arc<AtomicUsize>) -> usize {
    calls.load(Ordering::SeqCst)
}

pub(super) fn seeded_store() -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    store
        .set(collections::PROPERTIES, "p-1", json!({ "name": "Maple Court" }))
        .expect("seed property");
    store
        .set(collections::USERS, "t-1", json!({ "role": "tenant" }))
        .expect("seed tenant");
    store
}

pub(super) fn backend(store: &InMemoryDocumentStore, functions: Arc<ScriptedFunctions>) -> Backend {
    Backend::new(
        Arc::new(store.clone()),
        functions,
        Arc::new(InMemoryObjectStorage::default()),
    )
}

pub(super) fn service(
    store: &InMemoryDocumentStore,
    functions: Arc<ScriptedFunctions>,
    issuer: InviteIssuer,
) -> InviteService {
    InviteService::new(
        issuer,
        backend(store, functions),
        Arc::new(FixedClock(now())),
        JOIN_BASE_URL,
    )
}

pub(super) fn stored_invite(
    store: &InMemoryDocumentStore,
    code: &str,
    expires_at: DateTime<Utc>,
    origin: InviteOrigin,
) {
    let invite = InviteCode {
        code: code.to_string(),
        property_id: "p-1".to_string(),
        created_at: now() - chrono::Duration::days(1),
        expires_at,
        origin,
        consumed_by: None,
        consumed_at: None,
    };
    store
        .set(
            collections::INVITE_CODES,
            code,
            serde_json::to_value(invite).expect("serialize invite"),
        )
        .expect("seed invite");
}

pub(super) async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json body")
}

/// Document store whose every call fails as if the network were down.
pub(super) struct UnreachableStore;

impl DocumentStore for UnreachableStore {
    fn get(
        &self,
        _: &str,
        _: &str,
    ) -> Result<Option<crate::backend::Document>, crate::backend::StoreError> {
        Err(unreachable())
    }

    fn query(
        &self,
        _: &str,
        _: &crate::backend::Query,
    ) -> Result<Vec<crate::backend::Document>, crate::backend::StoreError> {
        Err(unreachable())
    }

    fn set(&self, _: &str, _: &str, _: Value) -> Result<(), crate::backend::StoreError> {
        Err(unreachable())
    }

    fn update(
        &self,
        _: &str,
        _: &str,
        _: &[crate::backend::FieldUpdate],
    ) -> Result<(), crate::backend::StoreError> {
        Err(unreachable())
    }

    fn claim(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: &[crate::backend::FieldUpdate],
    ) -> Result<bool, crate::backend::StoreError> {
        Err(unreachable())
    }

    fn subscribe(
        &self,
        _: &str,
        _: crate::backend::Query,
        _: crate::backend::SnapshotListener,
    ) -> Result<crate::backend::Subscription, crate::backend::StoreError> {
        Err(unreachable())
    }
}

fn unreachable() -> crate::backend::StoreError {
    crate::backend::StoreError::Unavailable("offline".into())
}
