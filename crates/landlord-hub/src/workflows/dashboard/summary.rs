use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::format::{format_date, relative_age};
use super::views::{DashboardSummary, PropertyEntry, RequestCard};
use crate::workflows::maintenance::{
    is_overdue, request_age, MaintenanceRequest, OverduePolicy, Priority, RequestStatistics,
    StatusBucket,
};
use crate::backend::Document;
use crate::workflows::onboarding::{aggregate, assess_document, display_name};

pub const UNSET_PRIORITY_LABEL: &str = "Not set";

impl DashboardSummary {
    /// Everything the landlord overview renders. Time-dependent fields are
    /// derived from `now`, so rebuild rather than cache.
    ///
    /// Properties are scored from their stored documents as-is, so a record
    /// with loosely typed fields is still listed.
    pub fn build(
        properties: &[Document],
        requests: &[MaintenanceRequest],
        now: DateTime<Utc>,
        policy: &OverduePolicy,
    ) -> Self {
        let statistics = RequestStatistics::compute(requests, now, policy);

        let mut open_by_property: HashMap<&str, usize> = HashMap::new();
        for request in requests {
            if matches!(
                request.status.bucket(),
                StatusBucket::Pending | StatusBucket::InProgress
            ) {
                *open_by_property.entry(request.property_id.as_str()).or_default() += 1;
            }
        }

        let property_entries: Vec<PropertyEntry> = properties
            .iter()
            .map(|property| {
                let completeness = assess_document(&property.data);
                PropertyEntry {
                    property_id: property.id.clone(),
                    name: display_name(&property.id, &property.data),
                    overall_score: completeness.overall_score,
                    status: completeness.status,
                    status_label: completeness.status_label,
                    missing_field_count: completeness.missing_field_count(),
                    open_requests: open_by_property
                        .get(property.id.as_str())
                        .copied()
                        .unwrap_or_default(),
                }
            })
            .collect();
        let average = aggregate(property_entries.iter().map(|entry| entry.overall_score));

        let names: HashMap<&str, String> = properties
            .iter()
            .map(|property| (property.id.as_str(), display_name(&property.id, &property.data)))
            .collect();

        let mut ordered: Vec<&MaintenanceRequest> = requests.iter().collect();
        // Newest first; undated tickets sink to the bottom.
        ordered.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        let cards = ordered
            .into_iter()
            .map(|request| {
                let bucket = request.status.bucket();
                RequestCard {
                    id: request.id.clone(),
                    property_id: request.property_id.clone(),
                    property_name: names.get(request.property_id.as_str()).cloned(),
                    title: request.title.clone(),
                    status: request.status,
                    status_label: request.status.label(),
                    bucket,
                    bucket_label: bucket.label(),
                    priority: request.priority,
                    priority_label: request
                        .priority
                        .map_or(UNSET_PRIORITY_LABEL, Priority::label),
                    created_at: request.created_at,
                    created_label: format_date(request.created_at),
                    age_label: relative_age(request_age(request, now)),
                    overdue: is_overdue(request, now, policy),
                    cost: request.effective_cost(),
                }
            })
            .collect();

        Self {
            generated_at: now,
            completion_rate: statistics.completion_rate(),
            statistics,
            average_property_score: average.score,
            average_property_status: average.status,
            properties: property_entries,
            requests: cards,
        }
    }
}
