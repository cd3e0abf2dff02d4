use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{MaintenanceRequest, Priority, StatusBucket};
use super::statistics::{is_overdue, OverduePolicy};

/// Dashboard filter selections; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestFilter {
    pub bucket: Option<StatusBucket>,
    pub priority: Option<Priority>,
    pub property_id: Option<String>,
    pub overdue_only: bool,
}

impl RequestFilter {
    pub fn matches(
        &self,
        request: &MaintenanceRequest,
        now: DateTime<Utc>,
        policy: &OverduePolicy,
    ) -> bool {
        if self
            .bucket
            .is_some_and(|bucket| request.status.bucket() != bucket)
        {
            return false;
        }
        if self
            .priority
            .is_some_and(|priority| request.priority != Some(priority))
        {
            return false;
        }
        if self
            .property_id
            .as_deref()
            .is_some_and(|property_id| request.property_id != property_id)
        {
            return false;
        }
        !self.overdue_only || is_overdue(request, now, policy)
    }

    pub fn apply<'a>(
        &self,
        requests: &'a [MaintenanceRequest],
        now: DateTime<Utc>,
        policy: &OverduePolicy,
    ) -> Vec<&'a MaintenanceRequest> {
        requests
            .iter()
            .filter(|request| self.matches(request, now, policy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::maintenance::domain::RequestStatus;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
            .single()
            .expect("valid now")
    }

    fn requests() -> Vec<MaintenanceRequest> {
        vec![
            MaintenanceRequest {
                id: "r-1".into(),
                property_id: "p-1".into(),
                status: RequestStatus::Pending,
                priority: Some(Priority::High),
                created_at: Some(now() - Duration::days(2)),
                ..MaintenanceRequest::default()
            },
            MaintenanceRequest {
                id: "r-2".into(),
                property_id: "p-2".into(),
                status: RequestStatus::Scheduled,
                priority: Some(Priority::Low),
                created_at: Some(now()),
                ..MaintenanceRequest::default()
            },
            MaintenanceRequest {
                id: "r-3".into(),
                property_id: "p-1".into(),
                status: RequestStatus::Completed,
                ..MaintenanceRequest::default()
            },
        ]
    }

    fn ids(matched: Vec<&MaintenanceRequest>) -> Vec<&str> {
        matched.into_iter().map(|request| request.id.as_str()).collect()
    }

    #[test]
    fn default_filter_matches_everything() {
        let requests = requests();
        let matched = RequestFilter::default().apply(&requests, now(), &OverduePolicy::default());
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn filters_combine() {
        let requests = requests();
        let policy = OverduePolicy::default();

        let by_property = RequestFilter {
            property_id: Some("p-1".into()),
            ..RequestFilter::default()
        };
        assert_eq!(ids(by_property.apply(&requests, now(), &policy)), vec!["r-1", "r-3"]);

        let overdue_high = RequestFilter {
            priority: Some(Priority::High),
            overdue_only: true,
            ..RequestFilter::default()
        };
        assert_eq!(ids(overdue_high.apply(&requests, now(), &policy)), vec!["r-1"]);

        let in_progress = RequestFilter {
            bucket: Some(StatusBucket::InProgress),
            ..RequestFilter::default()
        };
        assert_eq!(ids(in_progress.apply(&requests, now(), &policy)), vec!["r-2"]);
    }
}
