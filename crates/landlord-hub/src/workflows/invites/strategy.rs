use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;

use super::domain::{InviteCode, InviteOrigin, InviteRequest, DEMO_PREFIX};
use crate::backend::{collections, expect_success, DocumentStore, FunctionError, FunctionInvoker, StoreError};
use crate::workflows::maintenance::parse_timestamp;

pub const GENERATE_INVITE_FUNCTION: &str = "generateInviteCode";
pub const OFFLINE_CODE_LENGTH: usize = 8;
pub const DEMO_SUFFIX_LENGTH: usize = 6;

/// Uppercase letters and digits without the look-alikes 0/O and 1/I.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const OFFLINE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IssuanceError {
    #[error(transparent)]
    Function(#[from] FunctionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no unused invite code found after {0} attempts")]
    Exhausted(usize),
}

impl IssuanceError {
    /// Whether the next strategy in the chain may be tried.
    pub fn is_degradable(&self) -> bool {
        match self {
            Self::Function(error) => error.is_degradable(),
            Self::Store(StoreError::PermissionDenied(_) | StoreError::Unavailable(_)) => true,
            Self::Store(_) | Self::Exhausted(_) => false,
        }
    }
}

/// One way of producing an invite code.
pub trait IssuanceStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn issue(&self, request: &InviteRequest, now: DateTime<Utc>)
        -> Result<InviteCode, IssuanceError>;
}

/// Codes minted and persisted by the backend function.
pub struct ServerIssuance {
    functions: Arc<dyn FunctionInvoker>,
}

impl ServerIssuance {
    pub fn new(functions: Arc<dyn FunctionInvoker>) -> Self {
        Self { functions }
    }
}

impl IssuanceStrategy for ServerIssuance {
    fn name(&self) -> &'static str {
        "server"
    }

    fn issue(
        &self,
        request: &InviteRequest,
        now: DateTime<Utc>,
    ) -> Result<InviteCode, IssuanceError> {
        let response = self.functions.invoke(
            GENERATE_INVITE_FUNCTION,
            json!({
                "propertyId": request.property_id,
                "expirationDays": request.expires_in_days,
            }),
        )?;
        let response = expect_success(response)?;

        let code = response
            .get("code")
            .and_then(Value::as_str)
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| FunctionError::MalformedResponse("missing invite 'code'".to_string()))?;
        let expires_at = response
            .get("expiresAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_else(|| request.expires_at(now));

        Ok(InviteCode {
            code: code.to_string(),
            property_id: request.property_id.clone(),
            created_at: now,
            expires_at,
            origin: InviteOrigin::Server,
            consumed_by: None,
            consumed_at: None,
        })
    }
}

/// Codes generated locally and written straight to the invite collection.
pub struct OfflineIssuance {
    documents: Arc<dyn DocumentStore>,
}

impl OfflineIssuance {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }
}

impl IssuanceStrategy for OfflineIssuance {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn issue(
        &self,
        request: &InviteRequest,
        now: DateTime<Utc>,
    ) -> Result<InviteCode, IssuanceError> {
        for _ in 0..OFFLINE_ATTEMPTS {
            let code = random_code(OFFLINE_CODE_LENGTH);
            if self.documents.get(collections::INVITE_CODES, &code)?.is_some() {
                continue;
            }

            let invite = InviteCode {
                code,
                property_id: request.property_id.clone(),
                created_at: now,
                expires_at: request.expires_at(now),
                origin: InviteOrigin::Offline,
                consumed_by: None,
                consumed_at: None,
            };
            let body = serde_json::to_value(&invite).map_err(|err| StoreError::Decode {
                id: invite.code.clone(),
                message: err.to_string(),
            })?;
            self.documents
                .set(collections::INVITE_CODES, &invite.code, body)?;
            return Ok(invite);
        }

        Err(IssuanceError::Exhausted(OFFLINE_ATTEMPTS))
    }
}

/// Throwaway `DEMO-` codes. Never persisted and never redeemable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoIssuance;

impl IssuanceStrategy for DemoIssuance {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn issue(
        &self,
        request: &InviteRequest,
        now: DateTime<Utc>,
    ) -> Result<InviteCode, IssuanceError> {
        Ok(InviteCode {
            code: format!("{DEMO_PREFIX}{}", random_code(DEMO_SUFFIX_LENGTH)),
            property_id: request.property_id.clone(),
            created_at: now,
            expires_at: request.expires_at(now),
            origin: InviteOrigin::Demo,
            consumed_by: None,
            consumed_at: None,
        })
    }
}

pub fn random_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_codes_use_the_unambiguous_alphabet() {
        let code = random_code(64);
        assert_eq!(code.len(), 64);
        assert!(code.bytes().all(|byte| CODE_ALPHABET.contains(&byte)));
        assert!(!code.contains(['0', 'O', '1', 'I']));
    }

    #[test]
    fn degradable_classification() {
        assert!(IssuanceError::Function(FunctionError::Unauthenticated("x".into())).is_degradable());
        assert!(IssuanceError::Store(StoreError::Unavailable("down".into())).is_degradable());
        assert!(!IssuanceError::Function(FunctionError::Rejected("bad".into())).is_degradable());
        assert!(!IssuanceError::Exhausted(3).is_degradable());
    }
}
