use super::scoring::FieldDescriptor;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessCategory {
    Basic,
    Financial,
    Hvac,
    Plumbing,
    Electrical,
}

impl CompletenessCategory {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Basic,
            Self::Financial,
            Self::Hvac,
            Self::Plumbing,
            Self::Electrical,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic Information",
            Self::Financial => "Financial",
            Self::Hvac => "HVAC",
            Self::Plumbing => "Plumbing",
            Self::Electrical => "Electrical",
        }
    }

    /// Nested sub-record holding this category's fields; `None` means the property root.
    pub const fn record_key(self) -> Option<&'static str> {
        match self {
            Self::Basic | Self::Financial => None,
            Self::Hvac => Some("hvacData"),
            Self::Plumbing => Some("plumbingData"),
            Self::Electrical => Some("electricalData"),
        }
    }

    pub const fn fields(self) -> &'static [FieldDescriptor] {
        match self {
            Self::Basic => BASIC_FIELDS,
            Self::Financial => FINANCIAL_FIELDS,
            Self::Hvac => HVAC_FIELDS,
            Self::Plumbing => PLUMBING_FIELDS,
            Self::Electrical => ELECTRICAL_FIELDS,
        }
    }
}

const BASIC_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("name", "Property name"),
    FieldDescriptor::new("address.street", "Street address"),
    FieldDescriptor::new("address.city", "City"),
    FieldDescriptor::new("address.state", "State"),
    FieldDescriptor::new("address.zip", "ZIP code"),
    FieldDescriptor::new("propertyType", "Property type"),
    FieldDescriptor::new("squareFootage", "Square footage"),
    FieldDescriptor::new("yearBuilt", "Year built"),
    FieldDescriptor::new("units", "Units"),
    FieldDescriptor::new("bedrooms", "Bedrooms"),
    FieldDescriptor::new("bathrooms", "Bathrooms"),
];

const FINANCIAL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("purchasePrice", "Purchase price"),
    FieldDescriptor::new("monthlyRent", "Monthly rent"),
    FieldDescriptor::new("propertyTax", "Property tax"),
    FieldDescriptor::new("insuranceCost", "Insurance"),
    FieldDescriptor::new("mortgagePayment", "Mortgage payment"),
];

const HVAC_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("currentSystems", "Current systems"),
    FieldDescriptor::new("systemAge", "System age"),
    FieldDescriptor::new("fuelType", "Fuel type"),
    FieldDescriptor::new("filterSize", "Filter size"),
    FieldDescriptor::new("thermostatType", "Thermostat type"),
    FieldDescriptor::new("lastServiceDate", "Last service date"),
];

const PLUMBING_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("waterHeaterType", "Water heater type"),
    FieldDescriptor::new("waterHeaterAge", "Water heater age"),
    FieldDescriptor::new("pipeMaterial", "Pipe material"),
    FieldDescriptor::new("mainShutoffLocation", "Main shutoff location"),
    FieldDescriptor::new("sewerType", "Sewer type"),
];

const ELECTRICAL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("panelAmperage", "Panel amperage"),
    FieldDescriptor::new("panelLocation", "Panel location"),
    FieldDescriptor::new("panelBrand", "Panel brand"),
    FieldDescriptor::new("wiringType", "Wiring type"),
    FieldDescriptor::new("gfciProtection", "GFCI protection"),
];
