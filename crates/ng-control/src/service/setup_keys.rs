//! Setup key operations

use std::time::Duration;

use ng_core::time;
use ng_core::{AccessError, Expiry, SetupKeyType};

use super::ManagementService;
use crate::auth::{AuthClaims, ScopeOverride};
use crate::projection::SetupKeyView;

/// Request to create a setup key
#[derive(Debug, Clone, Default)]
pub struct CreateSetupKey {
    pub name: String,
    /// `reusable` or `one-off`
    pub key_type: String,
    /// `None` falls back to the configured default; zero never expires
    pub expires_in: Option<Duration>,
    pub account_override: Option<String>,
    pub user_override: Option<String>,
}

/// Request to change a setup key
#[derive(Debug, Clone, Default)]
pub struct SetupKeyUpdate {
    /// Rename when present and non-empty
    pub name: Option<String>,
    /// Revoke when set; a revoked key can't be restored
    pub revoked: bool,
}

impl ManagementService {
    /// Setup keys of the caller's account
    pub async fn list_setup_keys(&self, claims: &AuthClaims) -> Result<Vec<SetupKeyView>, AccessError> {
        let account = self.resolver.resolve(claims).await?;
        let now = time::now();
        Ok(account
            .setup_keys
            .iter()
            .map(|key| SetupKeyView::new(key, now))
            .collect())
    }

    pub async fn get_setup_key(
        &self,
        claims: &AuthClaims,
        key_id: &str,
    ) -> Result<SetupKeyView, AccessError> {
        let account = self.resolver.resolve(claims).await?;
        let key = account
            .setup_key(key_id)
            .ok_or_else(|| AccessError::NotFound(format!("setup key not found: {key_id}")))?;
        Ok(SetupKeyView::new(key, time::now()))
    }

    /// Create a setup key in the caller's account, or in an overridden one
    ///
    /// Claims are checked first. The request is validated before the
    /// override is resolved, so a rejected request never creates an account
    /// for the named user.
    pub async fn create_setup_key(
        &self,
        claims: &AuthClaims,
        request: CreateSetupKey,
    ) -> Result<SetupKeyView, AccessError> {
        claims.user()?;
        if request.name.trim().is_empty() {
            return Err(AccessError::InvalidArgument(
                "setup key name shouldn't be empty".to_string(),
            ));
        }
        let key_type: SetupKeyType = request.key_type.parse()?;
        let ttl = request.expires_in.unwrap_or(self.default_setup_key_ttl);
        Expiry::from_ttl(time::now(), ttl)?;

        let requested = ScopeOverride {
            account_id: request.account_override,
            user_id: request.user_override,
        };
        let (principal, _) = self.resolver.resolve_principal(claims).await?;
        let account_id = self.authorizer.authorize_scope(&principal, &requested).await?;

        let key = self
            .manager
            .add_setup_key(&account_id, &request.name, key_type, ttl)
            .await?;
        Ok(SetupKeyView::new(&key, time::now()))
    }

    /// Rename and/or revoke a setup key of the caller's account
    pub async fn update_setup_key(
        &self,
        claims: &AuthClaims,
        key_id: &str,
        update: SetupKeyUpdate,
    ) -> Result<SetupKeyView, AccessError> {
        claims.user()?;
        let name = update.name.filter(|name| !name.trim().is_empty());
        if name.is_none() && !update.revoked {
            return Err(AccessError::InvalidArgument(
                "update requests neither a rename nor a revocation".to_string(),
            ));
        }

        let account = self.resolver.resolve(claims).await?;
        let mut key = None;
        if update.revoked {
            key = Some(self.manager.revoke_setup_key(&account.id, key_id).await?);
        }
        if let Some(name) = name {
            key = Some(self.manager.rename_setup_key(&account.id, key_id, &name).await?);
        }

        let key = key.ok_or_else(|| AccessError::NotFound(format!("setup key not found: {key_id}")))?;
        Ok(SetupKeyView::new(&key, time::now()))
    }

    /// Redeem a setup key of the caller's account by its secret
    pub async fn redeem_setup_key(
        &self,
        claims: &AuthClaims,
        secret: &str,
    ) -> Result<SetupKeyView, AccessError> {
        claims.user()?;
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(AccessError::InvalidArgument("setup key shouldn't be empty".to_string()));
        }
        let account = self.resolver.resolve(claims).await?;
        let key = self.manager.redeem_setup_key(&account.id, secret).await?;
        tracing::info!("Setup key {} redeemed in account {}", key.id, account.id);
        Ok(SetupKeyView::new(&key, time::now()))
    }
}
