//! Core error types for netgate

use std::path::PathBuf;
use thiserror::Error;

/// Domain error returned by every access-control operation.
///
/// The variant alone decides how a caller should react: `Internal` may be
/// retried with backoff, everything else is final.
#[derive(Error, Debug)]
pub enum AccessError {
    /// Claims missing or malformed
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Reserved for privileged-action checks
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Account, peer, user or setup key absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request failed validation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Backing store failure
    #[error("Internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl AccessError {
    /// Whether a well-behaved client may retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccessError::Internal(_))
    }

    /// Short machine-readable kind name
    pub fn kind(&self) -> &'static str {
        match self {
            AccessError::Unauthenticated(_) => "unauthenticated",
            AccessError::PermissionDenied(_) => "permission_denied",
            AccessError::NotFound(_) => "not_found",
            AccessError::InvalidArgument(_) => "invalid_argument",
            AccessError::Internal(_) => "internal",
        }
    }
}

/// Errors surfaced by an [`AccountManager`](crate::traits::AccountManager)
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Account not found
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// No account is bound to the user
    #[error("no account for user: {0}")]
    UserNotFound(String),

    /// Peer not found
    #[error("peer not found: {0}")]
    PeerNotFound(String),

    /// Setup key not found
    #[error("setup key not found: {0}")]
    SetupKeyNotFound(String),

    /// Request rejected by the manager's own validation
    #[error("{0}")]
    InvalidArgument(String),

    /// Setup key exists but cannot be redeemed
    #[error("setup key {id} is {state}")]
    InvalidSetupKey { id: String, state: String },

    /// Backing store failure
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<ManagerError> for AccessError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::AccountNotFound(_)
            | ManagerError::UserNotFound(_)
            | ManagerError::PeerNotFound(_)
            | ManagerError::SetupKeyNotFound(_) => AccessError::NotFound(err.to_string()),
            ManagerError::InvalidArgument(_) | ManagerError::InvalidSetupKey { .. } => {
                AccessError::InvalidArgument(err.to_string())
            }
            ManagerError::Store(source) => AccessError::Internal(source),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_not_found_maps_to_not_found() {
        let err: AccessError = ManagerError::AccountNotFound("acc-1".into()).into();
        assert!(matches!(err, AccessError::NotFound(_)));
        assert!(err.to_string().contains("acc-1"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_store_failure_is_retryable_internal() {
        let err: AccessError = ManagerError::Store(anyhow::anyhow!("disk full")).into();
        assert_eq!(err.kind(), "internal");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unredeemable_key_is_invalid_argument() {
        let err: AccessError = ManagerError::InvalidSetupKey {
            id: "k1".into(),
            state: "revoked".into(),
        }
        .into();
        assert_eq!(err.kind(), "invalid_argument");
    }
}
