//! User listing

use ng_core::{AccessError, User};

use super::ManagementService;
use crate::auth::AuthClaims;

impl ManagementService {
    /// Users of the caller's account
    pub async fn list_users(&self, claims: &AuthClaims) -> Result<Vec<User>, AccessError> {
        let account = self.resolver.resolve(claims).await?;
        Ok(account.users)
    }
}
