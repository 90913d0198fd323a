//! Scope authorization
//!
//! By default an operation targets the caller's own account. An operator may
//! retarget it to another account, either by naming the account or by naming
//! a user whose account is resolved (and created if needed). Overrides from
//! anyone else are ignored rather than rejected, so an ordinary caller can't
//! probe which accounts exist through error responses.

use std::sync::Arc;

use ng_core::{AccessError, AccountId, UserId};

use super::audit::{AuditEvent, AuditSink, OverrideKind};
use super::operators::OperatorPolicy;
use super::resolver::PrincipalResolver;
use super::Principal;

/// Optional retargeting requested by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeOverride {
    /// Act on this account
    pub account_id: Option<String>,
    /// Act on the account of this user; wins over `account_id`
    pub user_id: Option<String>,
}

impl ScopeOverride {
    /// No override
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            account_id: None,
            user_id: Some(user_id.into()),
        }
    }

    pub fn for_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            user_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.account_id.is_none() && self.user_id.is_none()
    }
}

/// Decides which account an operation targets
pub struct ScopeAuthorizer {
    resolver: Arc<PrincipalResolver>,
    operators: Arc<dyn OperatorPolicy>,
    audit: Arc<dyn AuditSink>,
}

impl ScopeAuthorizer {
    pub fn new(
        resolver: Arc<PrincipalResolver>,
        operators: Arc<dyn OperatorPolicy>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            resolver,
            operators,
            audit,
        }
    }

    /// Whether the principal may override scope
    pub fn is_operator(&self, principal: &Principal) -> bool {
        self.operators.is_operator(principal)
    }

    /// Determine the account an operation targets
    ///
    /// Named accounts are not checked for existence here; the manager
    /// operation that follows fails with `NotFound` instead.
    pub async fn authorize_scope(
        &self,
        principal: &Principal,
        requested: &ScopeOverride,
    ) -> Result<AccountId, AccessError> {
        if requested.is_empty() {
            return Ok(principal.account_id.clone());
        }

        if !self.operators.is_operator(principal) {
            self.audit.record(AuditEvent::OverrideIgnored {
                user_id: principal.user_id.clone(),
                account_id: principal.account_id.clone(),
                requested_account: requested.account_id.clone(),
                requested_user: requested.user_id.clone(),
            });
            return Ok(principal.account_id.clone());
        }

        let (target, via) = if let Some(user_id) = &requested.user_id {
            let user_id = UserId::new(non_empty(user_id, "user")?);
            let account = self.resolver.resolve_user(&user_id, None).await?;
            (account.id, OverrideKind::User)
        } else if let Some(account_id) = &requested.account_id {
            (
                AccountId::new(non_empty(account_id, "account")?),
                OverrideKind::Account,
            )
        } else {
            return Ok(principal.account_id.clone());
        };

        tracing::info!(
            "Operator {} acting on account {} (own account {})",
            principal.user_id,
            target,
            principal.account_id
        );
        self.audit.record(AuditEvent::OverrideGranted {
            operator: principal.user_id.clone(),
            operator_account: principal.account_id.clone(),
            target_account: target.clone(),
            via,
        });

        Ok(target)
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, AccessError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AccessError::InvalidArgument(format!(
            "{what} override must not be empty"
        )));
    }
    Ok(value)
}
