//! Principal resolution
//!
//! Maps verified claims to the account that owns the caller. The first
//! request from a new user creates that account; the manager guarantees the
//! creation is atomic, so concurrent first requests share one account.

use std::sync::Arc;

use ng_core::traits::AccountManager;
use ng_core::{AccessError, Account, UserId};

use super::{AuthClaims, Principal};

/// Resolves claims to an account scope
pub struct PrincipalResolver {
    manager: Arc<dyn AccountManager>,
    /// Domain for new accounts when claims carry no hint
    default_domain: String,
}

impl PrincipalResolver {
    pub fn new(manager: Arc<dyn AccountManager>, default_domain: impl Into<String>) -> Self {
        Self {
            manager,
            default_domain: default_domain.into(),
        }
    }

    /// Resolve the account owning the caller, creating it on first contact
    ///
    /// Malformed claims fail with `Unauthenticated` before the manager is
    /// consulted.
    pub async fn resolve(&self, claims: &AuthClaims) -> Result<Account, AccessError> {
        let user_id = claims.user()?;
        self.resolve_user(&user_id, claims.domain_hint()).await
    }

    /// Resolve the account owning `user_id`, creating it on first contact
    pub async fn resolve_user(
        &self,
        user_id: &UserId,
        domain: Option<&str>,
    ) -> Result<Account, AccessError> {
        let domain = domain.unwrap_or(&self.default_domain);
        let account = self
            .manager
            .get_or_create_account_by_user(user_id, domain)
            .await?;
        tracing::debug!("Resolved user {} to account {}", user_id, account.id);
        Ok(account)
    }

    /// Resolve the caller's principal together with its account
    pub async fn resolve_principal(
        &self,
        claims: &AuthClaims,
    ) -> Result<(Principal, Account), AccessError> {
        let user_id = claims.user()?;
        let account = self.resolve_user(&user_id, claims.domain_hint()).await?;
        let is_admin = self.manager.is_user_admin(&user_id).await?;
        let principal = Principal {
            user_id,
            account_id: account.id.clone(),
            is_admin,
        };
        Ok((principal, account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAccountManager;

    fn resolver() -> (Arc<InMemoryAccountManager>, PrincipalResolver) {
        let manager = Arc::new(InMemoryAccountManager::new());
        let resolver = PrincipalResolver::new(manager.clone(), "netgate.test");
        (manager, resolver)
    }

    #[tokio::test]
    async fn test_first_contact_creates_admin_account() {
        let (manager, resolver) = resolver();
        let (principal, account) = resolver
            .resolve_principal(&AuthClaims::new("alice"))
            .await
            .unwrap();
        assert!(principal.is_admin);
        assert_eq!(principal.account_id, account.id);
        assert_eq!(account.domain, "netgate.test");
        assert_eq!(account.created_by, UserId::new("alice"));
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_domain_hint_used_for_new_account() {
        let (_, resolver) = resolver();
        let account = resolver
            .resolve(&AuthClaims::new("bob").with_domain("corp.example"))
            .await
            .unwrap();
        assert_eq!(account.domain, "corp.example");

        // the hint doesn't move an existing account
        let again = resolver
            .resolve(&AuthClaims::new("bob").with_domain("other.example"))
            .await
            .unwrap();
        assert_eq!(again.id, account.id);
        assert_eq!(again.domain, "corp.example");
    }

    #[tokio::test]
    async fn test_malformed_claims_rejected_before_lookup() {
        let (manager, resolver) = resolver();
        let err = resolver.resolve(&AuthClaims::new("  ")).await.unwrap_err();
        assert!(matches!(err, AccessError::Unauthenticated(_)));
        assert!(manager.is_empty());
    }
}
