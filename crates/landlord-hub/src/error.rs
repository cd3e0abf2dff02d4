use crate::backend::{FunctionError, StorageError, StoreError};
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::contractors::RelationshipError;
use crate::workflows::invites::InviteError;
use crate::workflows::maintenance::{
    AttachmentError, BulkError, MaintenanceImportError, TriageError,
};
use crate::workflows::validation::ValidationErrors;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(MaintenanceImportError),
    Json(serde_json::Error),
    Validation(ValidationErrors),
    NotFound(String),
    Store(StoreError),
    Function(FunctionError),
    Storage(StorageError),
    Invite(InviteError),
    Triage(TriageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Json(err) => write!(f, "invalid json: {}", err),
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::NotFound(what) => write!(f, "not found: {}", what),
            AppError::Store(err) => write!(f, "document store error: {}", err),
            AppError::Function(err) => write!(f, "backend function error: {}", err),
            AppError::Storage(err) => write!(f, "object storage error: {}", err),
            AppError::Invite(err) => write!(f, "invite error: {}", err),
            AppError::Triage(err) => write!(f, "triage error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::NotFound(_) => None,
            AppError::Store(err) => Some(err),
            AppError::Function(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Invite(err) => Some(err),
            AppError::Triage(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Import(_)
            | AppError::Json(_)
            | AppError::Validation(_)
            | AppError::Triage(TriageError::MissingFields(_) | TriageError::Malformed(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) | AppError::Invite(InviteError::UnknownCode(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Store(_)
            | AppError::Function(_)
            | AppError::Storage(_)
            | AppError::Invite(_)
            | AppError::Triage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Validation(errors) => Json(json!({
                "error": self.to_string(),
                "fields": errors.errors,
            })),
            _ => Json(json!({ "error": self.to_string() })),
        };
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<MaintenanceImportError> for AppError {
    fn from(value: MaintenanceImportError) -> Self {
        Self::Import(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { collection, id } => Self::NotFound(format!("{collection}/{id}")),
            other => Self::Store(other),
        }
    }
}

impl From<FunctionError> for AppError {
    fn from(value: FunctionError) -> Self {
        Self::Function(value)
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::NotFound(key) => Self::NotFound(key),
            other => Self::Storage(other),
        }
    }
}

impl From<InviteError> for AppError {
    fn from(value: InviteError) -> Self {
        match value {
            InviteError::Validation(errors) => Self::Validation(errors),
            other => Self::Invite(other),
        }
    }
}

impl From<TriageError> for AppError {
    fn from(value: TriageError) -> Self {
        Self::Triage(value)
    }
}

impl From<BulkError> for AppError {
    fn from(value: BulkError) -> Self {
        match value {
            BulkError::Validation(errors) => Self::Validation(errors),
            BulkError::Function(err) => Self::Function(err),
        }
    }
}

impl From<RelationshipError> for AppError {
    fn from(value: RelationshipError) -> Self {
        match value {
            RelationshipError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id}")),
            RelationshipError::Validation(errors) => Self::Validation(errors),
            RelationshipError::Store(err) => err.into(),
        }
    }
}

impl From<AttachmentError> for AppError {
    fn from(value: AttachmentError) -> Self {
        match value {
            AttachmentError::Validation(errors) => Self::Validation(errors),
            AttachmentError::Store(err) => err.into(),
            AttachmentError::Storage(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_families_to_status_codes() {
        let cases = [
            (
                AppError::from(ValidationErrors::single("request_ids", "is required")),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(StoreError::not_found("properties", "p-9")),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(TriageError::MissingFields(vec!["parts_needed".into()])),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(FunctionError::Internal("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::from(InviteError::UnknownCode("ABCDEFGH".into())),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn relationship_not_found_keeps_entity_in_message() {
        let error = AppError::from(RelationshipError::NotFound {
            entity: "tenant",
            id: "t-9".into(),
        });
        assert_eq!(error.to_string(), "not found: tenant t-9");
    }
}
