use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::domain::{InviteCode, InviteRequest, DEFAULT_EXPIRATION_DAYS, DEMO_PREFIX};
use super::strategy::{
    DemoIssuance, IssuanceError, IssuanceStrategy, OfflineIssuance, ServerIssuance,
};
use crate::backend::{collections, Backend, FieldUpdate, StoreError};
use crate::clock::Clock;
use crate::config::{FallbackMode, InviteConfig};
use crate::workflows::contractors::{RelationshipError, RelationshipService};
use crate::workflows::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("invite issuance failed via {strategy}: {source}")]
    Issuance {
        strategy: &'static str,
        #[source]
        source: IssuanceError,
    },
    #[error("no invite issuance strategies configured")]
    NoStrategies,
    #[error("invite code {0} does not exist")]
    UnknownCode(String),
    #[error("demo invite codes cannot be redeemed")]
    DemoCode,
    #[error("invite code {0} has expired")]
    Expired(String),
    #[error("invite code {0} has already been used")]
    AlreadyRedeemed(String),
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ordered chain of issuance strategies. A strategy is only skipped when it
/// fails with a degradable error; every strategy runs at most once per call.
pub struct InviteIssuer {
    strategies: Vec<Box<dyn IssuanceStrategy>>,
}

impl InviteIssuer {
    pub fn new(strategies: Vec<Box<dyn IssuanceStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(mode: FallbackMode, backend: &Backend) -> Self {
        let mut strategies: Vec<Box<dyn IssuanceStrategy>> =
            vec![Box::new(ServerIssuance::new(backend.functions()))];
        if matches!(mode, FallbackMode::Offline | FallbackMode::Demo) {
            strategies.push(Box::new(OfflineIssuance::new(backend.documents())));
        }
        if mode == FallbackMode::Demo {
            strategies.push(Box::new(DemoIssuance));
        }
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    pub fn issue(
        &self,
        request: &InviteRequest,
        now: DateTime<Utc>,
    ) -> Result<InviteCode, InviteError> {
        request.validate()?;

        let mut last_failure = None;
        for (index, strategy) in self.strategies.iter().enumerate() {
            match strategy.issue(request, now) {
                Ok(invite) => {
                    info!(
                        property_id = %request.property_id,
                        strategy = strategy.name(),
                        "issued invite code"
                    );
                    return Ok(invite);
                }
                Err(error) if error.is_degradable() && index + 1 < self.strategies.len() => {
                    warn!(
                        property_id = %request.property_id,
                        strategy = strategy.name(),
                        error = %error,
                        "invite issuance degraded to next strategy"
                    );
                    last_failure = Some((strategy.name(), error));
                }
                Err(error) => {
                    return Err(InviteError::Issuance {
                        strategy: strategy.name(),
                        source: error,
                    })
                }
            }
        }

        match last_failure {
            Some((strategy, source)) => Err(InviteError::Issuance { strategy, source }),
            None => Err(InviteError::NoStrategies),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedInvite {
    #[serde(flatten)]
    pub invite: InviteCode,
    pub join_url: String,
    pub origin_label: &'static str,
}

/// Issues, regenerates, and redeems tenant invite codes.
pub struct InviteService {
    issuer: InviteIssuer,
    backend: Backend,
    relationships: RelationshipService,
    clock: Arc<dyn Clock>,
    join_base_url: String,
    default_expiration_days: u32,
}

impl InviteService {
    pub fn new(
        issuer: InviteIssuer,
        backend: Backend,
        clock: Arc<dyn Clock>,
        join_base_url: impl Into<String>,
    ) -> Self {
        let relationships = RelationshipService::new(backend.documents());
        Self {
            issuer,
            backend,
            relationships,
            clock,
            join_base_url: join_base_url.into(),
            default_expiration_days: DEFAULT_EXPIRATION_DAYS,
        }
    }

    pub fn from_config(config: &InviteConfig, backend: Backend, clock: Arc<dyn Clock>) -> Self {
        let issuer = InviteIssuer::from_config(config.fallback, &backend);
        Self::new(issuer, backend, clock, config.join_base_url.clone())
            .with_default_expiration_days(config.ttl_days)
    }

    pub fn with_default_expiration_days(mut self, days: u32) -> Self {
        self.default_expiration_days = days;
        self
    }

    /// Lifetime applied when a caller does not ask for one.
    pub fn default_expiration_days(&self) -> u32 {
        self.default_expiration_days
    }

    pub fn issue(&self, request: &InviteRequest) -> Result<IssuedInvite, InviteError> {
        let invite = self.issuer.issue(request, self.clock.now())?;
        Ok(IssuedInvite {
            join_url: invite.join_url(&self.join_base_url),
            origin_label: invite.origin.label(),
            invite,
        })
    }

    /// Mint a fresh code for the property. Earlier codes stay valid until they expire.
    pub fn regenerate(&self, request: &InviteRequest) -> Result<IssuedInvite, InviteError> {
        self.issue(request)
    }

    pub fn redeem(&self, code: &str, tenant_id: &str) -> Result<InviteCode, InviteError> {
        let code = code.trim();
        let mut errors = ValidationErrors::new();
        if code.is_empty() {
            errors.push("code", "is required");
        }
        if tenant_id.trim().is_empty() {
            errors.push("tenant_id", "is required");
        }
        errors.into_result()?;

        if code.starts_with(DEMO_PREFIX) {
            return Err(InviteError::DemoCode);
        }

        let documents = self.backend.documents();
        let document = documents
            .get(collections::INVITE_CODES, code)?
            .ok_or_else(|| InviteError::UnknownCode(code.to_string()))?;
        let mut invite: InviteCode = document.parse()?;

        let now = self.clock.now();
        if invite.is_demo() {
            return Err(InviteError::DemoCode);
        }
        if invite.is_consumed() {
            return Err(InviteError::AlreadyRedeemed(invite.code));
        }
        if invite.is_expired(now) {
            return Err(InviteError::Expired(invite.code));
        }

        // Claim the code before linking so two tenants cannot both redeem it.
        let claimed = documents.claim(
            collections::INVITE_CODES,
            code,
            "consumedBy",
            &[
                FieldUpdate::set("consumedBy", tenant_id),
                FieldUpdate::set("consumedAt", now.to_rfc3339()),
            ],
        )?;
        if !claimed {
            return Err(InviteError::AlreadyRedeemed(invite.code));
        }

        if let Err(error) = self.relationships.link_tenant(&invite.property_id, tenant_id) {
            let release = [
                FieldUpdate::Delete {
                    field: "consumedBy".to_string(),
                },
                FieldUpdate::Delete {
                    field: "consumedAt".to_string(),
                },
            ];
            if let Err(release_error) = documents.update(collections::INVITE_CODES, code, &release) {
                warn!(code, error = %release_error, "failed to release invite claim");
            }
            return Err(error.into());
        }

        info!(code, tenant_id, property_id = %invite.property_id, "redeemed invite code");
        invite.consumed_by = Some(tenant_id.to_string());
        invite.consumed_at = Some(now);
        Ok(invite)
    }
}
