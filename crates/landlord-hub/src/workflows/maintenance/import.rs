use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use super::domain::{parse_amount, parse_timestamp, MaintenanceRequest, Priority, RequestStatus};

#[derive(Debug)]
pub enum MaintenanceImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for MaintenanceImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaintenanceImportError::Io(err) => {
                write!(f, "failed to read maintenance export: {}", err)
            }
            MaintenanceImportError::Csv(err) => {
                write!(f, "invalid maintenance CSV data: {}", err)
            }
        }
    }
}

impl std::error::Error for MaintenanceImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MaintenanceImportError::Io(err) => Some(err),
            MaintenanceImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for MaintenanceImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for MaintenanceImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads tickets from a spreadsheet export of the maintenance board.
pub struct MaintenanceImporter;

impl MaintenanceImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<MaintenanceRequest>, MaintenanceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows with a repeated request id are ignored after the first occurrence.
    pub fn from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<MaintenanceRequest>, MaintenanceImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut seen: HashSet<String> = HashSet::new();
        let mut requests = Vec::new();

        for row in csv_reader.deserialize::<TicketRow>() {
            let row = row?;
            if !seen.insert(row.id.clone()) {
                continue;
            }
            requests.push(row.into_request());
        }

        Ok(requests)
    }
}

#[derive(Debug, Deserialize)]
struct TicketRow {
    #[serde(rename = "Request ID")]
    id: String,
    #[serde(rename = "Property ID", default)]
    property_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(rename = "Priority", default, deserialize_with = "empty_string_as_none")]
    priority: Option<String>,
    #[serde(rename = "Created At", default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
    #[serde(
        rename = "Scheduled Date",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    scheduled_date: Option<String>,
    #[serde(
        rename = "Estimated Cost",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    estimated_cost: Option<String>,
    #[serde(rename = "Actual Cost", default, deserialize_with = "empty_string_as_none")]
    actual_cost: Option<String>,
    #[serde(
        rename = "Contractor ID",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    contractor_id: Option<String>,
}

impl TicketRow {
    fn into_request(self) -> MaintenanceRequest {
        MaintenanceRequest {
            id: self.id,
            property_id: self.property_id,
            contractor_id: self.contractor_id,
            title: self.title,
            status: self
                .status
                .as_deref()
                .map(RequestStatus::parse)
                .unwrap_or_default(),
            priority: self.priority.as_deref().and_then(Priority::parse),
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            scheduled_date: self.scheduled_date.as_deref().and_then(parse_timestamp),
            estimated_cost: self.estimated_cost.as_deref().and_then(parse_amount),
            actual_cost: self.actual_cost.as_deref().and_then(parse_amount),
            ..MaintenanceRequest::default()
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
