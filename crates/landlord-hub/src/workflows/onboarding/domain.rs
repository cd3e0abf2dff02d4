use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Open-ended system details (HVAC, plumbing, electrical) keyed by field name.
pub type SystemRecord = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// A landlord's property as stored in the `properties` collection.
///
/// Nothing is guaranteed present; partially onboarded properties are normal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub name: Option<String>,
    pub address: Option<Address>,
    pub property_type: Option<String>,
    pub square_footage: Option<u32>,
    pub year_built: Option<u16>,
    pub units: Option<u16>,
    pub bedrooms: Option<u16>,
    pub bathrooms: Option<f32>,
    pub purchase_price: Option<f64>,
    pub monthly_rent: Option<f64>,
    pub property_tax: Option<f64>,
    pub insurance_cost: Option<f64>,
    pub mortgage_payment: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tenant_ids: Vec<String>,
    pub hvac_data: Option<SystemRecord>,
    pub plumbing_data: Option<SystemRecord>,
    pub electrical_data: Option<SystemRecord>,
}

/// Label for a stored property: its name, else its street, else its id.
///
/// Reads the raw document so that loosely typed records still get a label.
pub fn display_name(id: &str, document: &Value) -> String {
    let text = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    };
    let address = document.get("address");

    text(document.get("name"))
        .or_else(|| text(address.and_then(|address| address.get("street"))))
        .or_else(|| text(address))
        .unwrap_or_else(|| format!("Property {id}"))
}
