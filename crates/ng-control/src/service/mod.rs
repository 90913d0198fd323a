//! Management operations
//!
//! Transport-agnostic counterparts of the management API endpoints. Every
//! operation takes the caller's verified claims explicitly, resolves the
//! caller's principal, settles the target account through the scope
//! authorizer and only then calls into the account manager.

mod peers;
mod setup_keys;
mod users;

pub use peers::PeerChanges;
pub use setup_keys::{CreateSetupKey, SetupKeyUpdate};

use std::sync::Arc;
use std::time::Duration;

use ng_core::traits::AccountManager;
use ng_core::{AccessError, Account};

use crate::auth::{AuthClaims, Principal, PrincipalResolver, ScopeAuthorizer, ScopeOverride};

/// Entry point for all management operations
pub struct ManagementService {
    manager: Arc<dyn AccountManager>,
    resolver: Arc<PrincipalResolver>,
    authorizer: Arc<ScopeAuthorizer>,
    /// Lifetime of setup keys created without an explicit expiry
    default_setup_key_ttl: Duration,
}

impl ManagementService {
    pub fn new(
        manager: Arc<dyn AccountManager>,
        resolver: Arc<PrincipalResolver>,
        authorizer: Arc<ScopeAuthorizer>,
        default_setup_key_ttl: Duration,
    ) -> Self {
        Self {
            manager,
            resolver,
            authorizer,
            default_setup_key_ttl,
        }
    }

    /// Resolve the caller and the account the operation targets
    ///
    /// Returns the caller's own account when no override is granted, so the
    /// common path doesn't fetch it twice.
    async fn scoped_account(
        &self,
        claims: &AuthClaims,
        requested: &ScopeOverride,
    ) -> Result<(Principal, Account), AccessError> {
        let (principal, own) = self.resolver.resolve_principal(claims).await?;
        let target = self.authorizer.authorize_scope(&principal, requested).await?;
        if target == own.id {
            return Ok((principal, own));
        }
        let account = self.manager.get_account_by_id(&target).await?;
        Ok((principal, account))
    }
}
