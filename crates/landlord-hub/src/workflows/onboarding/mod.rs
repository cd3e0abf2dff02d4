//! Property-data completeness: per-category field scoring and the overall
//! readiness rollup shown on the onboarding dashboard.

pub mod domain;
mod fields;
pub mod scoring;

pub use domain::{display_name, Address, Property, SystemRecord};
pub use fields::CompletenessCategory;
pub use scoring::{
    aggregate, is_present, percentage, score_fields, CategoryScore, FieldDescriptor,
    OverallScore, ReadinessTier, TierThresholds, CATEGORY_THRESHOLDS, OVERALL_THRESHOLDS,
};

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCompleteness {
    pub category: CompletenessCategory,
    pub category_label: &'static str,
    #[serde(flatten)]
    pub result: CategoryScore,
    pub status_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyCompleteness {
    pub overall_score: u8,
    pub status: ReadinessTier,
    pub status_label: &'static str,
    pub categories: Vec<CategoryCompleteness>,
}

impl PropertyCompleteness {
    pub fn category(&self, category: CompletenessCategory) -> Option<&CategoryCompleteness> {
        self.categories
            .iter()
            .find(|entry| entry.category == category)
    }

    pub fn missing_field_count(&self) -> usize {
        self.categories
            .iter()
            .map(|entry| entry.result.missing_fields.len())
            .sum()
    }
}

pub fn assess_property(property: &Property) -> PropertyCompleteness {
    let document = serde_json::to_value(property).unwrap_or(Value::Null);
    assess_document(&document)
}

/// Score a raw property document, e.g. one read straight from the store.
pub fn assess_document(document: &Value) -> PropertyCompleteness {
    let categories: Vec<CategoryCompleteness> = CompletenessCategory::ordered()
        .into_iter()
        .map(|category| {
            let record = match category.record_key() {
                Some(key) => document.get(key),
                None => Some(document),
            };
            let result = score_fields(record, category.fields());
            CategoryCompleteness {
                category,
                category_label: category.label(),
                status_label: result.status.label(),
                result,
            }
        })
        .collect();

    let overall = aggregate(categories.iter().map(|entry| entry.result.score));

    PropertyCompleteness {
        overall_score: overall.score,
        status: overall.status,
        status_label: overall.status.label(),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn onboarded_property() -> Property {
        serde_json::from_value(json!({
            "id": "p-1",
            "name": "Maple Court",
            "address": { "street": "12 Maple", "city": "Ames", "state": "IA", "zip": "50010" },
            "propertyType": "duplex",
            "squareFootage": 1850,
            "yearBuilt": 1978,
            "units": 2,
            "bedrooms": 4,
            "bathrooms": 2.5,
            "purchasePrice": 210000.0,
            "monthlyRent": 1850.0,
            "propertyTax": 3200.0,
            "insuranceCost": 1100.0,
            "mortgagePayment": 1200.0,
            "hvacData": {
                "currentSystems": ["furnace", "central air"],
                "systemAge": 8,
                "fuelType": "gas",
                "filterSize": "16x25x1",
                "thermostatType": "smart",
                "lastServiceDate": "2025-04-02"
            },
            "plumbingData": {
                "waterHeaterType": "tank",
                "waterHeaterAge": 6,
                "pipeMaterial": "PEX",
                "mainShutoffLocation": "basement",
                "sewerType": "municipal"
            },
            "electricalData": {
                "panelAmperage": 200,
                "panelLocation": "garage",
                "panelBrand": "Square D",
                "wiringType": "copper",
                "gfciProtection": true
            }
        }))
        .expect("valid property")
    }

    #[test]
    fn fully_onboarded_property_is_complete() {
        let report = assess_property(&onboarded_property());
        assert_eq!(report.overall_score, 100);
        assert_eq!(report.status, ReadinessTier::Complete);
        assert_eq!(report.missing_field_count(), 0);
        assert_eq!(report.categories.len(), 5);
    }

    #[test]
    fn absent_sub_records_score_zero_without_failing() {
        let mut property = onboarded_property();
        property.hvac_data = None;
        property.electrical_data = None;

        let report = assess_property(&property);
        let hvac = report.category(CompletenessCategory::Hvac).expect("hvac");
        assert_eq!(hvac.result.score, 0);
        assert_eq!(hvac.result.missing_fields.len(), 6);
        assert_eq!(report.overall_score, 60);
        assert_eq!(report.status, ReadinessTier::Partial);
    }

    #[test]
    fn empty_property_is_insufficient_everywhere() {
        let report = assess_property(&Property::default());
        assert_eq!(report.overall_score, 0);
        assert!(report
            .categories
            .iter()
            .all(|entry| entry.result.status == ReadinessTier::Insufficient));
    }

    #[test]
    fn category_partial_but_overall_insufficient_shows_threshold_gap() {
        let document = json!({
            "name": "Elm Flats",
            "address": { "street": "4 Elm", "city": "Ames", "state": "IA", "zip": "50010" },
            "propertyType": "apartment",
            "purchasePrice": 100000,
            "monthlyRent": 900,
            "propertyTax": 1500,
            "hvacData": { "currentSystems": ["boiler"], "systemAge": 20, "fuelType": "gas" },
            "plumbingData": { "waterHeaterType": "tank", "waterHeaterAge": 3, "pipeMaterial": "copper" },
            "electricalData": { "panelAmperage": 100, "panelLocation": "closet", "panelBrand": "GE" }
        });

        let report = assess_document(&document);
        for entry in &report.categories {
            assert_eq!(entry.result.status, ReadinessTier::Partial, "{:?}", entry.category);
        }
        assert_eq!(report.overall_score, 57);
        assert_eq!(report.status, ReadinessTier::Insufficient);
    }

    #[test]
    fn serialized_report_flattens_category_scores() {
        let report = assess_property(&Property::default());
        let payload = serde_json::to_value(&report).expect("serializes");
        assert_eq!(payload["categories"][0]["category"], "basic");
        assert_eq!(payload["categories"][0]["score"], 0);
        assert_eq!(payload["categories"][0]["status"], "insufficient");
        assert_eq!(payload["status_label"], "Insufficient");
    }
}
