//! Maintenance tickets: domain model, dashboard statistics, filters, CSV
//! import, bulk updates, photo attachments, and repair triage.

pub mod attachments;
pub mod bulk;
pub mod domain;
pub mod filter;
pub mod import;
pub mod statistics;
pub mod triage;

pub use attachments::{Attachment, AttachmentError, AttachmentService, MAX_ATTACHMENT_BYTES};
pub use bulk::{BulkDispatcher, BulkError, BulkOperation, BulkOutcome, BULK_UPDATE_FUNCTION};
pub use domain::{
    parse_amount, parse_timestamp, MaintenanceRequest, Priority, RequestStatus, StatusBucket,
};
pub use filter::RequestFilter;
pub use import::{MaintenanceImportError, MaintenanceImporter};
pub use statistics::{is_overdue, request_age, OverduePolicy, RequestStatistics};
pub use triage::{
    interpret, Complexity, RepairAnalyst, RepairAssessment, RepairTriageService, TriageDecision,
    TriageError,
};
