use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{MaintenanceRequest, StatusBucket};

/// Age thresholds after which an unfinished request counts as overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverduePolicy {
    /// Pending/submitted requests older than this are overdue.
    pub pending_hours: u32,
    /// In-progress requests with no scheduled date older than this are overdue.
    pub unscheduled_hours: u32,
}

impl Default for OverduePolicy {
    fn default() -> Self {
        Self {
            pending_hours: 24,
            unscheduled_hours: 168,
        }
    }
}

impl OverduePolicy {
    fn pending_limit(&self) -> Duration {
        Duration::hours(i64::from(self.pending_hours))
    }

    fn unscheduled_limit(&self) -> Duration {
        Duration::hours(i64::from(self.unscheduled_hours))
    }
}

/// Time since creation. Missing or future creation timestamps count as just created.
pub fn request_age(request: &MaintenanceRequest, now: DateTime<Utc>) -> Duration {
    request
        .created_at
        .map(|created| now.signed_duration_since(created))
        .filter(|age| *age > Duration::zero())
        .unwrap_or_else(Duration::zero)
}

pub fn is_overdue(request: &MaintenanceRequest, now: DateTime<Utc>, policy: &OverduePolicy) -> bool {
    let age = request_age(request, now);
    match request.status.bucket() {
        StatusBucket::Pending => age > policy.pending_limit(),
        StatusBucket::InProgress => match request.scheduled_date {
            Some(scheduled) => scheduled < now,
            None => age > policy.unscheduled_limit(),
        },
        StatusBucket::Completed | StatusBucket::Other => false,
    }
}

/// Counts shown on the maintenance dashboard. Depends on `now`, so it must be
/// recomputed whenever it is displayed rather than cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RequestStatistics {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    pub total_cost: f64,
}

impl RequestStatistics {
    pub fn compute(
        requests: &[MaintenanceRequest],
        now: DateTime<Utc>,
        policy: &OverduePolicy,
    ) -> Self {
        requests
            .iter()
            .fold(Self::default(), |mut stats, request| {
                stats.total += 1;
                match request.status.bucket() {
                    StatusBucket::Pending => stats.pending += 1,
                    StatusBucket::InProgress => stats.in_progress += 1,
                    StatusBucket::Completed => stats.completed += 1,
                    StatusBucket::Other => {}
                }
                if is_overdue(request, now, policy) {
                    stats.overdue += 1;
                }
                stats.total_cost += request.effective_cost();
                stats
            })
    }

    pub fn open(&self) -> usize {
        self.pending + self.in_progress
    }

    /// Completed share of all requests, 0.0 when there are none.
    pub fn completion_rate(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}
