use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum RequestStatus {
    Submitted,
    Pending,
    Assigned,
    InProgress,
    Scheduled,
    RequiresParts,
    PendingApproval,
    OnHold,
    Completed,
    /// Anything the dashboard does not recognize; counted in no bucket.
    Other,
}

impl RequestStatus {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::Submitted,
            Self::Pending,
            Self::Assigned,
            Self::InProgress,
            Self::Scheduled,
            Self::RequiresParts,
            Self::PendingApproval,
            Self::OnHold,
            Self::Completed,
        ]
    }

    /// Accepts `in-progress`, `in_progress`, and `In Progress` alike.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|ch| match ch {
                '_' | ' ' => '-',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "submitted" | "new" | "open" => Self::Submitted,
            "pending" => Self::Pending,
            "assigned" => Self::Assigned,
            "in-progress" => Self::InProgress,
            "scheduled" => Self::Scheduled,
            "requires-parts" => Self::RequiresParts,
            "pending-approval" => Self::PendingApproval,
            "on-hold" => Self::OnHold,
            "completed" | "complete" | "closed" => Self::Completed,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in-progress",
            Self::Scheduled => "scheduled",
            Self::RequiresParts => "requires-parts",
            Self::PendingApproval => "pending-approval",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Scheduled => "Scheduled",
            Self::RequiresParts => "Requires Parts",
            Self::PendingApproval => "Pending Approval",
            Self::OnHold => "On Hold",
            Self::Completed => "Completed",
            Self::Other => "Unknown",
        }
    }

    pub const fn bucket(self) -> StatusBucket {
        match self {
            Self::Submitted | Self::Pending => StatusBucket::Pending,
            Self::Assigned
            | Self::InProgress
            | Self::Scheduled
            | Self::RequiresParts
            | Self::PendingApproval
            | Self::OnHold => StatusBucket::InProgress,
            Self::Completed => StatusBucket::Completed,
            Self::Other => StatusBucket::Other,
        }
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Submitted
    }
}

impl From<String> for RequestStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// The three dashboard columns a status rolls up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Pending,
    InProgress,
    Completed,
    Other,
}

impl StatusBucket {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "normal" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" | "emergency" | "critical" => Some(Self::Urgent),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown priority '{value}'"))
    }
}

/// A maintenance ticket as stored in the `maintenanceRequests` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaintenanceRequest {
    pub id: String,
    pub property_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landlord_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contractor_id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "lenient_status")]
    pub status: RequestStatus,
    #[serde(
        alias = "urgency",
        deserialize_with = "lenient_priority",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<Priority>,
    #[serde(
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_cost: Option<f64>,
    #[serde(
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_cost: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photo_urls: Vec<String>,
}

impl MaintenanceRequest {
    /// Actual cost when recorded, otherwise the estimate, otherwise zero.
    pub fn effective_cost(&self) -> f64 {
        self.actual_cost.or(self.estimated_cost).unwrap_or(0.0)
    }
}

/// Parse the timestamp spellings found in ticket documents and exports.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_timestamp(raw),
        Value::Number(millis) => millis
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::Object(fields) => {
            let seconds = fields
                .get("seconds")
                .or_else(|| fields.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = fields
                .get("nanoseconds")
                .or_else(|| fields.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        _ => None,
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(timestamp_from_value))
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => parse_amount(&raw),
        _ => None,
    }
    .filter(|amount| amount.is_finite()))
}

fn lenient_status<'de, D>(deserializer: D) -> Result<RequestStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .map(RequestStatus::parse)
        .unwrap_or_default())
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(Priority::parse))
}

/// `"$1,250.50"` → `1250.5`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statuses_parse_in_any_spelling() {
        assert_eq!(RequestStatus::parse("In Progress"), RequestStatus::InProgress);
        assert_eq!(RequestStatus::parse("requires_parts"), RequestStatus::RequiresParts);
        assert_eq!(RequestStatus::parse("ON-HOLD"), RequestStatus::OnHold);
        assert_eq!(RequestStatus::parse("cancelled"), RequestStatus::Other);
        assert_eq!(
            serde_json::to_value(RequestStatus::PendingApproval).expect("serializes"),
            json!("pending-approval")
        );
    }

    #[test]
    fn buckets_cover_every_known_status() {
        let pending = RequestStatus::ordered()
            .into_iter()
            .filter(|status| status.bucket() == StatusBucket::Pending)
            .count();
        let in_progress = RequestStatus::ordered()
            .into_iter()
            .filter(|status| status.bucket() == StatusBucket::InProgress)
            .count();
        assert_eq!(pending, 2);
        assert_eq!(in_progress, 6);
        assert_eq!(RequestStatus::Completed.bucket(), StatusBucket::Completed);
    }

    #[test]
    fn requests_tolerate_malformed_fields() {
        let request: MaintenanceRequest = serde_json::from_value(json!({
            "id": "r-1",
            "propertyId": "p-1",
            "title": "Leaky faucet",
            "status": "in_progress",
            "urgency": "Emergency",
            "createdAt": "yesterday-ish",
            "scheduledDate": { "seconds": 1759651200, "nanoseconds": 0 },
            "estimatedCost": "$1,250.50",
            "actualCost": null
        }))
        .expect("lenient parse");

        assert_eq!(request.status, RequestStatus::InProgress);
        assert_eq!(request.priority, Some(Priority::Urgent));
        assert!(request.created_at.is_none());
        assert_eq!(
            request.scheduled_date,
            Utc.timestamp_opt(1_759_651_200, 0).single()
        );
        assert_eq!(request.effective_cost(), 1250.5);
    }

    #[test]
    fn timestamps_accept_millis_and_local_datetimes() {
        let request: MaintenanceRequest = serde_json::from_value(json!({
            "createdAt": 1_700_000_000_000i64,
            "scheduledDate": "2025-10-05T14:30",
            "priority": "whenever"
        }))
        .expect("parse");

        assert_eq!(
            request.created_at,
            Utc.timestamp_millis_opt(1_700_000_000_000).single()
        );
        assert_eq!(
            request.scheduled_date,
            Utc.with_ymd_and_hms(2025, 10, 5, 14, 30, 0).single()
        );
        assert!(request.priority.is_none());
        assert_eq!(request.status, RequestStatus::Submitted);
    }

    #[test]
    fn effective_cost_prefers_actual_then_estimate() {
        let mut request = MaintenanceRequest {
            estimated_cost: Some(80.0),
            ..MaintenanceRequest::default()
        };
        assert_eq!(request.effective_cost(), 80.0);
        request.actual_cost = Some(95.0);
        assert_eq!(request.effective_cost(), 95.0);
        request.actual_cost = None;
        request.estimated_cost = None;
        assert_eq!(request.effective_cost(), 0.0);
    }
}
