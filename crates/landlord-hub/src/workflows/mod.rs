pub mod contractors;
pub mod dashboard;
pub mod invites;
pub mod maintenance;
pub mod onboarding;
pub mod validation;
