//! Property management core shared by the landlord dashboard and its API.

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
