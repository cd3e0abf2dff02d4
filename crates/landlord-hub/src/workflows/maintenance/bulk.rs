use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::domain::{Priority, RequestStatus};
use crate::backend::{expect_success, FunctionError, FunctionInvoker};
use crate::workflows::validation::ValidationErrors;

pub const BULK_UPDATE_FUNCTION: &str = "bulkUpdateRequests";

/// One action applied to every selected ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkOperation {
    UpdateStatus { status: RequestStatus },
    AssignContractor { contractor_id: String },
    SetPriority { priority: Priority },
    Close,
}

impl BulkOperation {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UpdateStatus { .. } => "update_status",
            Self::AssignContractor { .. } => "assign_contractor",
            Self::SetPriority { .. } => "set_priority",
            Self::Close => "close",
        }
    }

    /// Field changes the backend applies to each ticket.
    fn updates(&self) -> Value {
        match self {
            Self::UpdateStatus { status } => json!({ "status": status.as_str() }),
            Self::AssignContractor { contractor_id } => json!({
                "contractorId": contractor_id,
                "status": RequestStatus::Assigned.as_str(),
            }),
            Self::SetPriority { priority } => json!({ "priority": priority.as_str() }),
            Self::Close => json!({ "status": RequestStatus::Completed.as_str() }),
        }
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        match self {
            Self::UpdateStatus {
                status: RequestStatus::Other,
            } => errors.push("status", "is not a known request status"),
            Self::AssignContractor { contractor_id } if contractor_id.trim().is_empty() => {
                errors.push("contractor_id", "is required")
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub operation: &'static str,
    pub requested: usize,
    pub updated: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// Sends a whole selection to the backend as one call. The backend applies it
/// all-or-nothing; partial success is not tracked here.
pub struct BulkDispatcher {
    functions: Arc<dyn FunctionInvoker>,
}

impl BulkDispatcher {
    pub fn new(functions: Arc<dyn FunctionInvoker>) -> Self {
        Self { functions }
    }

    pub fn dispatch(
        &self,
        request_ids: &[String],
        operation: &BulkOperation,
    ) -> Result<BulkOutcome, BulkError> {
        let mut errors = ValidationErrors::new();
        let mut seen = HashSet::new();
        let selected: Vec<&str> = request_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .collect();

        if selected.is_empty() {
            errors.push("request_ids", "select at least one request");
        }
        operation.validate(&mut errors);
        errors.into_result()?;

        let payload = json!({
            "requestIds": selected,
            "operation": operation.name(),
            "updates": operation.updates(),
        });
        let response = expect_success(self.functions.invoke(BULK_UPDATE_FUNCTION, payload)?)?;

        let updated = response
            .get("updated")
            .and_then(Value::as_u64)
            .map_or(selected.len(), |count| count as usize);

        info!(
            operation = operation.name(),
            requested = selected.len(),
            updated,
            "bulk maintenance update applied"
        );

        Ok(BulkOutcome {
            operation: operation.name(),
            requested: selected.len(),
            updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingFunctions {
        calls: Mutex<Vec<(String, Value)>>,
        fail_with: Option<FunctionError>,
    }

    impl FunctionInvoker for RecordingFunctions {
        fn invoke(&self, name: &str, args: Value) -> Result<Value, FunctionError> {
            let count = args["requestIds"].as_array().map_or(0, Vec::len);
            self.calls
                .lock()
                .expect("calls mutex poisoned")
                .push((name.to_string(), args));
            match &self.fail_with {
                Some(error) => Err(error.clone()),
                None => Ok(json!({ "success": true, "updated": count })),
            }
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn dispatches_a_single_deduplicated_call() {
        let functions = Arc::new(RecordingFunctions::default());
        let dispatcher = BulkDispatcher::new(functions.clone());

        let outcome = dispatcher
            .dispatch(
                &ids(&["r-1", "r-2", "r-1", " "]),
                &BulkOperation::AssignContractor {
                    contractor_id: "c-7".into(),
                },
            )
            .expect("dispatch succeeds");

        assert_eq!(outcome.requested, 2);
        assert_eq!(outcome.updated, 2);

        let calls = functions.calls.lock().expect("calls mutex poisoned");
        assert_eq!(calls.len(), 1);
        let (name, payload) = &calls[0];
        assert_eq!(name, BULK_UPDATE_FUNCTION);
        assert_eq!(payload["requestIds"], json!(["r-1", "r-2"]));
        assert_eq!(payload["updates"]["contractorId"], "c-7");
        assert_eq!(payload["updates"]["status"], "assigned");
    }

    #[test]
    fn empty_selection_is_rejected_without_calling_backend() {
        let functions = Arc::new(RecordingFunctions::default());
        let dispatcher = BulkDispatcher::new(functions.clone());

        let error = dispatcher
            .dispatch(&[], &BulkOperation::Close)
            .expect_err("empty selection");
        match error {
            BulkError::Validation(errors) => assert!(errors.for_field("request_ids").is_some()),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(functions.calls.lock().expect("calls mutex poisoned").is_empty());
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let dispatcher = BulkDispatcher::new(Arc::new(RecordingFunctions::default()));
        let error = dispatcher
            .dispatch(
                &ids(&["r-1"]),
                &BulkOperation::UpdateStatus {
                    status: RequestStatus::Other,
                },
            )
            .expect_err("invalid status");
        assert!(matches!(error, BulkError::Validation(_)));
    }

    #[test]
    fn backend_failures_surface_once() {
        let functions = Arc::new(RecordingFunctions {
            fail_with: Some(FunctionError::PermissionDenied("not the owner".into())),
            ..RecordingFunctions::default()
        });
        let dispatcher = BulkDispatcher::new(functions.clone());

        let error = dispatcher
            .dispatch(&ids(&["r-1"]), &BulkOperation::Close)
            .expect_err("permission denied");
        assert!(matches!(
            error,
            BulkError::Function(FunctionError::PermissionDenied(_))
        ));
        assert_eq!(functions.calls.lock().expect("calls mutex poisoned").len(), 1);
    }

    #[test]
    fn operations_deserialize_from_tagged_json() {
        let operation: BulkOperation =
            serde_json::from_value(json!({ "type": "set_priority", "priority": "urgent" }))
                .expect("parses");
        assert_eq!(
            operation,
            BulkOperation::SetPriority {
                priority: Priority::Urgent
            }
        );
    }
}
