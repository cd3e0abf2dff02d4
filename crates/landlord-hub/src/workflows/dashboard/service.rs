use std::sync::Arc;

use super::feed::decode_requests;
use super::views::DashboardSummary;
use crate::backend::{collections, DocumentStore, Query, StoreError};
use crate::clock::Clock;
use crate::workflows::maintenance::OverduePolicy;

/// Loads a landlord's properties and tickets and builds the overview.
pub struct DashboardService {
    documents: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    policy: OverduePolicy,
}

impl DashboardService {
    pub fn new(documents: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, policy: OverduePolicy) -> Self {
        Self {
            documents,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> OverduePolicy {
        self.policy
    }

    pub fn summary(&self, landlord_id: &str) -> Result<DashboardSummary, StoreError> {
        let properties = self
            .documents
            .query(collections::PROPERTIES, &Query::new().eq("ownerId", landlord_id))?;

        let snapshot = self.documents.query(
            collections::MAINTENANCE_REQUESTS,
            &Query::new().eq("landlordId", landlord_id),
        )?;
        let requests = decode_requests(&snapshot);

        Ok(DashboardSummary::build(
            &properties,
            &requests,
            self.clock.now(),
            &self.policy,
        ))
    }
}
