//! Account manager capability

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::error::ManagerError;
use crate::setup_key::{SetupKey, SetupKeyType};
use crate::types::{Account, AccountId, Peer, UserId};

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Replacement values for a peer's mutable fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerUpdate {
    /// Key of the peer to update
    pub key: String,
    pub name: String,
    pub ssh_enabled: bool,
}

/// Persistence and mutation of accounts and everything they own
///
/// Implementations serialize writes to a single record. Account creation on
/// first contact must be an atomic create-if-absent: concurrent calls for the
/// same user observe the same account.
#[async_trait]
pub trait AccountManager: Send + Sync {
    /// Get an account by its identifier
    async fn get_account_by_id(&self, account_id: &AccountId) -> ManagerResult<Account>;

    /// Get the account a user belongs to
    async fn get_account_by_user(&self, user_id: &UserId) -> ManagerResult<Account>;

    /// Get the account a user belongs to, creating it on first contact
    async fn get_or_create_account_by_user(
        &self,
        user_id: &UserId,
        domain: &str,
    ) -> ManagerResult<Account>;

    /// Whether the user is an admin of its account
    async fn is_user_admin(&self, user_id: &UserId) -> ManagerResult<bool>;

    /// Create a setup key in the account
    async fn add_setup_key(
        &self,
        account_id: &AccountId,
        name: &str,
        key_type: SetupKeyType,
        ttl: Duration,
    ) -> ManagerResult<SetupKey>;

    /// Rename a setup key
    async fn rename_setup_key(
        &self,
        account_id: &AccountId,
        key_id: &str,
        name: &str,
    ) -> ManagerResult<SetupKey>;

    /// Revoke a setup key
    async fn revoke_setup_key(&self, account_id: &AccountId, key_id: &str)
        -> ManagerResult<SetupKey>;

    /// Record an enrollment made with the setup key whose secret is `key`
    async fn redeem_setup_key(&self, account_id: &AccountId, key: &str)
        -> ManagerResult<SetupKey>;

    /// Find a peer by its network address
    async fn get_peer_by_ip(&self, account_id: &AccountId, ip: IpAddr) -> ManagerResult<Peer>;

    /// Update a peer's name and SSH flag
    async fn update_peer(&self, account_id: &AccountId, update: PeerUpdate)
        -> ManagerResult<Peer>;

    /// Remove a peer from the account and from every group
    async fn delete_peer(&self, account_id: &AccountId, peer_key: &str) -> ManagerResult<Peer>;
}
