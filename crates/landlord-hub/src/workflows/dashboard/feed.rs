use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::{collections, Document, DocumentStore, Query, StoreError, Subscription};
use crate::clock::Clock;
use crate::workflows::maintenance::{MaintenanceRequest, OverduePolicy, RequestStatistics};

/// One push from the live maintenance listener.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub generated_at: DateTime<Utc>,
    pub requests: Vec<MaintenanceRequest>,
    pub statistics: RequestStatistics,
}

pub struct MaintenanceFeed;

impl MaintenanceFeed {
    /// Subscribe to a landlord's tickets. `on_update` runs once with the
    /// current tickets and again after every change, each time with statistics
    /// computed against a fresh `now`. Dropping the returned subscription stops it.
    pub fn watch<F>(
        documents: &dyn DocumentStore,
        landlord_id: &str,
        policy: OverduePolicy,
        clock: Arc<dyn Clock>,
        on_update: F,
    ) -> Result<Subscription, StoreError>
    where
        F: Fn(FeedUpdate) + Send + Sync + 'static,
    {
        let query = Query::new().eq("landlordId", landlord_id);
        let landlord = landlord_id.to_string();

        documents.subscribe(
            collections::MAINTENANCE_REQUESTS,
            query,
            Box::new(move |snapshot: &[Document]| {
                let requests = decode_requests(snapshot);
                let now = clock.now();
                let statistics = RequestStatistics::compute(&requests, now, &policy);
                debug!(
                    landlord_id = %landlord,
                    total = statistics.total,
                    overdue = statistics.overdue,
                    "maintenance snapshot received"
                );
                on_update(FeedUpdate {
                    generated_at: now,
                    requests,
                    statistics,
                });
            }),
        )
    }
}

/// Decode ticket documents, skipping any that cannot be read.
pub fn decode_requests(snapshot: &[Document]) -> Vec<MaintenanceRequest> {
    snapshot
        .iter()
        .filter_map(|document| match document.parse::<MaintenanceRequest>() {
            Ok(request) => Some(request),
            Err(error) => {
                warn!(document_id = %document.id, error = %error, "skipping unreadable maintenance request");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryDocumentStore;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
            .single()
            .expect("valid now")
    }

    #[test]
    fn pushes_fresh_statistics_until_dropped() {
        let store = InMemoryDocumentStore::new();
        store
            .set(
                collections::MAINTENANCE_REQUESTS,
                "r-1",
                json!({
                    "landlordId": "l-1",
                    "status": "pending",
                    "createdAt": "2025-09-29T12:00:00Z",
                    "estimatedCost": 40
                }),
            )
            .expect("seed");
        store
            .set(
                collections::MAINTENANCE_REQUESTS,
                "r-other",
                json!({ "landlordId": "l-2", "status": "pending" }),
            )
            .expect("seed");

        let updates: Arc<Mutex<Vec<FeedUpdate>>> = Arc::default();
        let sink = updates.clone();
        let subscription = MaintenanceFeed::watch(
            &store,
            "l-1",
            OverduePolicy::default(),
            Arc::new(FixedClock(now())),
            move |update| sink.lock().expect("updates mutex poisoned").push(update),
        )
        .expect("subscribe");

        store
            .set(
                collections::MAINTENANCE_REQUESTS,
                "r-2",
                json!({ "landlordId": "l-1", "status": "completed", "actualCost": 60 }),
            )
            .expect("insert");

        {
            let updates = updates.lock().expect("updates mutex poisoned");
            assert_eq!(updates.len(), 2);
            assert_eq!(updates[0].statistics.total, 1);
            assert_eq!(updates[0].statistics.overdue, 1);
            assert_eq!(updates[1].statistics.total, 2);
            assert_eq!(updates[1].statistics.completed, 1);
            assert_eq!(updates[1].statistics.total_cost, 100.0);
            assert_eq!(updates[1].generated_at, now());
        }

        drop(subscription);
        assert_eq!(store.listener_count(), 0);

        store
            .set(
                collections::MAINTENANCE_REQUESTS,
                "r-3",
                json!({ "landlordId": "l-1", "status": "pending" }),
            )
            .expect("insert after drop");
        assert_eq!(updates.lock().expect("updates mutex poisoned").len(), 2);
    }

    #[test]
    fn unreadable_documents_are_skipped() {
        let snapshot = vec![
            Document::new("r-1", json!({ "status": "pending" })),
            Document::new("r-2", json!({ "title": ["not", "a", "string"] })),
        ];
        let requests = decode_requests(&snapshot);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "r-1");
    }
}
