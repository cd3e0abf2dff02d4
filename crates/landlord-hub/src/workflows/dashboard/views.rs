use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflows::maintenance::{Priority, RequestStatistics, RequestStatus, StatusBucket};
use crate::workflows::onboarding::ReadinessTier;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyEntry {
    pub property_id: String,
    pub name: String,
    pub overall_score: u8,
    pub status: ReadinessTier,
    pub status_label: &'static str,
    pub missing_field_count: usize,
    pub open_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestCard {
    pub id: String,
    pub property_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    pub title: String,
    pub status: RequestStatus,
    pub status_label: &'static str,
    pub bucket: StatusBucket,
    pub bucket_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub priority_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub created_label: String,
    pub age_label: String,
    pub overdue: bool,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub generated_at: DateTime<Utc>,
    pub statistics: RequestStatistics,
    pub completion_rate: f32,
    pub average_property_score: u8,
    pub average_property_status: ReadinessTier,
    pub properties: Vec<PropertyEntry>,
    pub requests: Vec<RequestCard>,
}
