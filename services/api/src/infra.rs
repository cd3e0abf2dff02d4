use chrono::{DateTime, Duration, NaiveDate, Utc};
use landlord_hub::backend::{
    collections, Backend, DocumentStore, FieldUpdate, FunctionError, FunctionInvoker,
    InMemoryDocumentStore, InMemoryObjectStorage,
};
use landlord_hub::clock::Clock;
use landlord_hub::config::AppConfig;
use landlord_hub::workflows::dashboard::DashboardService;
use landlord_hub::workflows::invites::{
    random_code, InviteCode, InviteOrigin, InviteService, GENERATE_INVITE_FUNCTION,
    MAX_EXPIRATION_DAYS,
};
use landlord_hub::workflows::maintenance::{
    BulkDispatcher, OverduePolicy, RepairAnalyst, RepairTriageService, TriageError,
    BULK_UPDATE_FUNCTION,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Workflow services shared by the HTTP handlers.
#[derive(Clone)]
pub(crate) struct ApiServices {
    pub(crate) invites: Arc<InviteService>,
    pub(crate) dashboard: Arc<DashboardService>,
    pub(crate) bulk: Arc<BulkDispatcher>,
    pub(crate) triage: Arc<RepairTriageService<KeywordAnalyst>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) policy: OverduePolicy,
}

impl ApiServices {
    pub(crate) fn new(config: &AppConfig, backend: Backend, clock: Arc<dyn Clock>) -> Self {
        Self {
            invites: Arc::new(InviteService::from_config(
                &config.invites,
                backend.clone(),
                clock.clone(),
            )),
            dashboard: Arc::new(DashboardService::new(
                backend.documents(),
                clock.clone(),
                config.overdue,
            )),
            bulk: Arc::new(BulkDispatcher::new(backend.functions())),
            triage: Arc::new(RepairTriageService::new(Arc::new(KeywordAnalyst))),
            clock,
            policy: config.overdue,
        }
    }
}

/// Backend wired entirely in memory, with the serverless functions emulated locally.
pub(crate) fn in_memory_backend(
    store: &InMemoryDocumentStore,
    clock: Arc<dyn Clock>,
) -> Backend {
    Backend::new(
        Arc::new(store.clone()),
        Arc::new(LocalFunctions::new(store.clone(), clock)),
        Arc::new(InMemoryObjectStorage::default()),
    )
}

/// Local stand-in for the hosted function runtime.
pub(crate) struct LocalFunctions {
    documents: InMemoryDocumentStore,
    clock: Arc<dyn Clock>,
}

impl LocalFunctions {
    pub(crate) fn new(documents: InMemoryDocumentStore, clock: Arc<dyn Clock>) -> Self {
        Self { documents, clock }
    }

    fn generate_invite(&self, args: &Value) -> Result<Value, FunctionError> {
        let property_id = args
            .get("propertyId")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| FunctionError::Rejected("propertyId is required".to_string()))?;
        let days = args
            .get("expirationDays")
            .and_then(Value::as_i64)
            .unwrap_or(7);
        if !(1..=i64::from(MAX_EXPIRATION_DAYS)).contains(&days) {
            return Ok(json!({
                "success": false,
                "error": format!("expirationDays must be between 1 and {MAX_EXPIRATION_DAYS}"),
            }));
        }

        if self
            .documents
            .get(collections::PROPERTIES, property_id)
            .map_err(|err| FunctionError::Internal(err.to_string()))?
            .is_none()
        {
            return Ok(json!({ "success": false, "error": format!("property {property_id} not found") }));
        }

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| FunctionError::Internal("invite expiry out of range".to_string()))?;
        let invite = InviteCode {
            code: random_code(8),
            property_id: property_id.to_string(),
            created_at: now,
            expires_at,
            origin: InviteOrigin::Server,
            consumed_by: None,
            consumed_at: None,
        };
        let body = serde_json::to_value(&invite)
            .map_err(|err| FunctionError::Internal(err.to_string()))?;
        self.documents
            .set(collections::INVITE_CODES, &invite.code, body)
            .map_err(|err| FunctionError::Internal(err.to_string()))?;

        Ok(json!({
            "success": true,
            "code": invite.code,
            "expiresAt": invite.expires_at.to_rfc3339(),
        }))
    }

    fn bulk_update(&self, args: &Value) -> Result<Value, FunctionError> {
        let ids: Vec<&str> = args
            .get("requestIds")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let updates: Vec<FieldUpdate> = args
            .get("updates")
            .and_then(Value::as_object)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(field, value)| FieldUpdate::set(field, value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        for id in &ids {
            let exists = self
                .documents
                .get(collections::MAINTENANCE_REQUESTS, id)
                .map_err(|err| FunctionError::Internal(err.to_string()))?
                .is_some();
            if !exists {
                return Ok(json!({ "success": false, "error": format!("request {id} not found") }));
            }
        }

        for id in &ids {
            self.documents
                .update(collections::MAINTENANCE_REQUESTS, id, &updates)
                .map_err(|err| FunctionError::Internal(err.to_string()))?;
        }

        Ok(json!({ "success": true, "updated": ids.len() }))
    }
}

impl FunctionInvoker for LocalFunctions {
    fn invoke(&self, name: &str, args: Value) -> Result<Value, FunctionError> {
        match name {
            GENERATE_INVITE_FUNCTION => self.generate_invite(&args),
            BULK_UPDATE_FUNCTION => self.bulk_update(&args),
            other => Err(FunctionError::Rejected(format!("unknown function '{other}'"))),
        }
    }
}

/// Function runtime that is never reachable; exercises the invite fallbacks.
pub(crate) struct OfflineFunctions;

impl FunctionInvoker for OfflineFunctions {
    fn invoke(&self, name: &str, _args: Value) -> Result<Value, FunctionError> {
        Err(FunctionError::classify(
            "functions/unavailable",
            &format!("network request for {name} failed"),
        ))
    }
}

/// Rule-of-thumb analyst used when no model is attached. Answers in the same
/// JSON shape a model would.
pub(crate) struct KeywordAnalyst;

const CONTRACTOR_KEYWORDS: [&str; 7] = [
    "flood", "gas", "sparks", "burst", "sewage", "no heat", "roof",
];
const SELF_REPAIR_KEYWORDS: [(&str, &str); 3] = [
    (
        "breaker",
        "Open the electrical panel, find the tripped breaker, switch it fully off, then back on.",
    ),
    (
        "clog",
        "Use a plunger for a few minutes; if that fails, try a drain snake before calling us.",
    ),
    (
        "filter",
        "Turn the system off, slide out the old filter, and insert a new one with the arrow toward the blower.",
    ),
];

impl RepairAnalyst for KeywordAnalyst {
    fn analyze(&self, description: &str, _photo_urls: &[String]) -> Result<String, TriageError> {
        let text = description.to_ascii_lowercase();
        if text.trim().is_empty() {
            return Err(TriageError::Analyst("description is empty".to_string()));
        }

        let analysis = if CONTRACTOR_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
            json!({
                "parts_needed": true,
                "complexity_level": "high",
                "further_inquiry": false,
                "description_of_issue": description,
            })
        } else if let Some((_, instructions)) = SELF_REPAIR_KEYWORDS
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
        {
            json!({
                "parts_needed": false,
                "complexity_level": "low",
                "further_inquiry": false,
                "instructions": instructions,
                "description_of_issue": description,
            })
        } else {
            json!({
                "parts_needed": false,
                "complexity_level": "medium",
                "further_inquiry": true,
                "further_questions": "Where exactly is the problem, when did it start, and is anything leaking or sparking?",
                "description_of_issue": description,
            })
        };

        Ok(analysis.to_string())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// RFC 3339 timestamp or a plain date (midnight UTC).
pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(parsed.with_timezone(&Utc));
    }
    parse_date(raw)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as an RFC 3339 timestamp or YYYY-MM-DD"))
}
