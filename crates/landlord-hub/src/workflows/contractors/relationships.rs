use std::sync::Arc;
use tracing::info;

use super::domain::{Contractor, ContractorRating};
use crate::backend::{collections, DocumentStore, FieldUpdate, StoreError};
use crate::workflows::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum RelationshipError {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Keeps both sides of landlord/contractor and property/tenant links in step.
///
/// Every referenced document is checked before the first write, so a missing
/// entity leaves the store untouched. The two writes are not atomic.
pub struct RelationshipService {
    documents: Arc<dyn DocumentStore>,
}

impl RelationshipService {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    pub fn link_contractor(
        &self,
        landlord_id: &str,
        contractor_id: &str,
    ) -> Result<(), RelationshipError> {
        self.require(collections::USERS, "landlord", landlord_id)?;
        self.require(collections::CONTRACTORS, "contractor", contractor_id)?;

        self.documents.update(
            collections::USERS,
            landlord_id,
            &[FieldUpdate::array_union("contractorIds", contractor_id)],
        )?;
        self.documents.update(
            collections::CONTRACTORS,
            contractor_id,
            &[FieldUpdate::array_union("landlordIds", landlord_id)],
        )?;

        info!(landlord_id, contractor_id, "linked contractor to landlord");
        Ok(())
    }

    pub fn unlink_contractor(
        &self,
        landlord_id: &str,
        contractor_id: &str,
    ) -> Result<(), RelationshipError> {
        self.require(collections::USERS, "landlord", landlord_id)?;
        self.require(collections::CONTRACTORS, "contractor", contractor_id)?;

        self.documents.update(
            collections::USERS,
            landlord_id,
            &[FieldUpdate::array_remove("contractorIds", contractor_id)],
        )?;
        self.documents.update(
            collections::CONTRACTORS,
            contractor_id,
            &[FieldUpdate::array_remove("landlordIds", landlord_id)],
        )?;

        info!(landlord_id, contractor_id, "unlinked contractor from landlord");
        Ok(())
    }

    pub fn link_tenant(&self, property_id: &str, tenant_id: &str) -> Result<(), RelationshipError> {
        self.require(collections::PROPERTIES, "property", property_id)?;
        self.require(collections::USERS, "tenant", tenant_id)?;

        self.documents.update(
            collections::PROPERTIES,
            property_id,
            &[FieldUpdate::array_union("tenantIds", tenant_id)],
        )?;
        self.documents.update(
            collections::USERS,
            tenant_id,
            &[FieldUpdate::array_union("propertyIds", property_id)],
        )?;

        info!(property_id, tenant_id, "linked tenant to property");
        Ok(())
    }

    pub fn record_rating(
        &self,
        contractor_id: &str,
        stars: u8,
    ) -> Result<ContractorRating, RelationshipError> {
        if !(1..=5).contains(&stars) {
            return Err(ValidationErrors::single("stars", "must be between 1 and 5").into());
        }

        let document = self
            .documents
            .get(collections::CONTRACTORS, contractor_id)?
            .ok_or_else(|| RelationshipError::NotFound {
                entity: "contractor",
                id: contractor_id.to_string(),
            })?;
        let contractor: Contractor = document.parse()?;

        // Concurrent reviews must all land, so totals only ever move by increments.
        let mut updates = vec![
            FieldUpdate::increment("rating.starTotal", f64::from(stars)),
            FieldUpdate::increment("rating.reviewCount", 1.0),
        ];
        if document.data.pointer("/rating/starTotal").is_none() {
            // Older ratings carry only an average; seed the total from it once.
            updates.insert(
                0,
                FieldUpdate::set("rating.starTotal", contractor.rating.star_total),
            );
        }
        self.documents
            .update(collections::CONTRACTORS, contractor_id, &updates)?;

        let rating = self
            .documents
            .get(collections::CONTRACTORS, contractor_id)?
            .ok_or_else(|| RelationshipError::NotFound {
                entity: "contractor",
                id: contractor_id.to_string(),
            })?
            .parse::<Contractor>()?
            .rating;
        self.documents.update(
            collections::CONTRACTORS,
            contractor_id,
            &[FieldUpdate::set("rating.average", rating.average)],
        )?;

        info!(
            contractor_id,
            stars,
            average = rating.average,
            "recorded contractor rating"
        );
        Ok(rating)
    }

    fn require(
        &self,
        collection: &str,
        entity: &'static str,
        id: &str,
    ) -> Result<(), RelationshipError> {
        match self.documents.get(collection, id)? {
            Some(_) => Ok(()),
            None => Err(RelationshipError::NotFound {
                entity,
                id: id.to_string(),
            }),
        }
    }
}
