//! Contractor profiles and the relationship writes that tie landlords,
//! contractors, properties, and tenants together.

pub mod domain;
pub mod relationships;

pub use domain::{Contractor, ContractorRating};
pub use relationships::{RelationshipError, RelationshipService};

use serde_json::Value;

use crate::workflows::onboarding::{score_fields, CategoryScore, FieldDescriptor};

pub const CONTRACTOR_FIELDS: [FieldDescriptor; 5] = [
    FieldDescriptor::new("name", "Name"),
    FieldDescriptor::new("email", "Email"),
    FieldDescriptor::new("phone", "Phone"),
    FieldDescriptor::new("trades", "Trades"),
    FieldDescriptor::new("serviceArea", "Service area"),
];

/// How ready a contractor profile is to be shown to landlords.
pub fn assess_contractor(contractor: &Contractor) -> CategoryScore {
    let document = serde_json::to_value(contractor).unwrap_or(Value::Null);
    score_fields(Some(&document), &CONTRACTOR_FIELDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::onboarding::ReadinessTier;

    #[test]
    fn empty_profile_lists_every_field() {
        let score = assess_contractor(&Contractor::default());
        assert_eq!(score.score, 0);
        assert_eq!(score.status, ReadinessTier::Insufficient);
        assert_eq!(
            score.missing_fields,
            vec!["Name", "Email", "Phone", "Trades", "Service area"]
        );
    }

    #[test]
    fn four_of_five_fields_is_complete() {
        let contractor = Contractor {
            name: "Ada".into(),
            email: "ada@example.test".into(),
            phone: "555-0100".into(),
            trades: ["plumbing".to_string()].into_iter().collect(),
            ..Contractor::default()
        };
        let score = assess_contractor(&contractor);
        assert_eq!(score.score, 80);
        assert_eq!(score.status, ReadinessTier::Complete);
        assert_eq!(score.missing_fields, vec!["Service area"]);
    }
}
