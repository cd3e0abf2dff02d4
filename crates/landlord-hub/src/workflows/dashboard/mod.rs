//! Landlord overview: ticket statistics, property readiness, request cards,
//! and the live maintenance feed.

mod feed;
mod format;
mod service;
mod summary;
pub mod views;

pub use feed::{decode_requests, FeedUpdate, MaintenanceFeed};
pub use format::{format_date, relative_age, UNKNOWN_DATE_LABEL};
pub use service::DashboardService;
pub use summary::UNSET_PRIORITY_LABEL;
pub use views::{DashboardSummary, PropertyEntry, RequestCard};
