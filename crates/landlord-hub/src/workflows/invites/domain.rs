use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::validation::ValidationErrors;

pub const DEFAULT_EXPIRATION_DAYS: u32 = 7;
pub const MAX_EXPIRATION_DAYS: u32 = 365;
pub const DEMO_PREFIX: &str = "DEMO-";

fn default_expiration_days() -> u32 {
    DEFAULT_EXPIRATION_DAYS
}

/// Ask for a code that lets a tenant join `property_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub property_id: String,
    #[serde(default = "default_expiration_days", alias = "expirationDays")]
    pub expires_in_days: u32,
}

impl InviteRequest {
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            expires_in_days: DEFAULT_EXPIRATION_DAYS,
        }
    }

    pub fn with_expiration_days(mut self, days: u32) -> Self {
        self.expires_in_days = days;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.property_id.trim().is_empty() {
            errors.push("property_id", "is required");
        }
        if self.expires_in_days == 0 {
            errors.push("expires_in_days", "must be at least one day");
        } else if self.expires_in_days > MAX_EXPIRATION_DAYS {
            errors.push("expires_in_days", "must be at most 365 days");
        }
        errors.into_result()
    }

    /// Saturates at the latest representable instant instead of overflowing.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(Duration::days(i64::from(self.expires_in_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Which issuance path produced a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteOrigin {
    Server,
    Offline,
    Demo,
}

impl InviteOrigin {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Server => "Server issued",
            Self::Offline => "Issued offline",
            Self::Demo => "Demo only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub code: String,
    pub property_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub origin: InviteOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_at: Option<DateTime<Utc>>,
}

impl InviteCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_by.is_some()
    }

    pub fn is_demo(&self) -> bool {
        self.origin == InviteOrigin::Demo || self.code.starts_with(DEMO_PREFIX)
    }

    pub fn join_url(&self, base_url: &str) -> String {
        format!("{}/join?code={}", base_url.trim_end_matches('/'), self.code)
    }
}
