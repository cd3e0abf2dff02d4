//! Tenant invite codes: issuance through an ordered strategy chain, join
//! links, and redemption.

pub mod domain;
pub mod router;
pub mod service;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use domain::{
    InviteCode, InviteOrigin, InviteRequest, DEFAULT_EXPIRATION_DAYS, DEMO_PREFIX,
    MAX_EXPIRATION_DAYS,
};
pub use router::invite_router;
pub use service::{InviteError, InviteIssuer, InviteService, IssuedInvite};
pub use strategy::{
    random_code, DemoIssuance, IssuanceError, IssuanceStrategy, OfflineIssuance, ServerIssuance,
    CODE_ALPHABET, GENERATE_INVITE_FUNCTION,
};
