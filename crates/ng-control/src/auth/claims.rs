//! Identity claims and the per-request principal

use serde::{Deserialize, Serialize};

use ng_core::{AccessError, AccountId, UserId};

/// Verified identity claims of the caller
///
/// Produced by the transport after token verification and passed explicitly
/// to every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Stable user identifier (token subject)
    pub user_id: String,
    /// Organization or domain hint
    #[serde(default)]
    pub domain: Option<String>,
}

impl AuthClaims {
    /// Claims for a user without a domain hint
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            domain: None,
        }
    }

    /// Attach a domain hint
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Reject absent claims
    pub fn require(claims: Option<&AuthClaims>) -> Result<&AuthClaims, AccessError> {
        claims.ok_or_else(|| AccessError::Unauthenticated("missing claims".to_string()))
    }

    /// Extract the user id, rejecting malformed claims
    ///
    /// Subjects are compared exactly, so surrounding whitespace is malformed
    /// rather than trimmed.
    pub fn user(&self) -> Result<UserId, AccessError> {
        let user_id = self.user_id.as_str();
        if user_id.trim().is_empty() {
            return Err(AccessError::Unauthenticated(
                "claims carry no user id".to_string(),
            ));
        }
        if user_id.trim() != user_id || user_id.chars().any(char::is_control) {
            return Err(AccessError::Unauthenticated(
                "claims carry a malformed user id".to_string(),
            ));
        }
        Ok(UserId::new(user_id))
    }

    /// The domain hint, if present and non-empty
    pub fn domain_hint(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// The resolved identity and scope of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub account_id: AccountId,
    pub is_admin: bool,
}
