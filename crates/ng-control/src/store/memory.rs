//! In-memory account manager
//!
//! Accounts live in a sharded concurrent map keyed by account id, with a
//! second map from user id to account id. Writes to one account hold that
//! account's shard lock, which serializes mutations of a single record.
//!
//! First-contact creation goes through the entry API of the user map, so
//! the check for an existing account and the insertion of a new one happen
//! under the same shard lock. The account is inserted before the user
//! mapping, so a reader that sees the mapping always finds the account.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::net::IpAddr;
use std::time::Duration;

use ng_core::time;
use ng_core::traits::{AccountManager, ManagerResult, PeerUpdate};
use ng_core::{Account, AccountId, ManagerError, Peer, SetupKey, SetupKeyType, UserId};

/// Account manager keeping all state in process memory
#[derive(Default)]
pub struct InMemoryAccountManager {
    /// Accounts indexed by account ID
    accounts: DashMap<AccountId, Account>,
    /// Owning account of every known user
    users: DashMap<UserId, AccountId>,
}

impl InMemoryAccountManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager seeded with existing accounts
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let manager = Self::new();
        for account in accounts {
            manager.insert_account(account);
        }
        manager
    }

    /// Insert or replace an account and bind its users to it
    pub fn insert_account(&self, account: Account) {
        let account_id = account.id.clone();
        let user_ids: Vec<UserId> = account.users.iter().map(|u| u.id.clone()).collect();
        self.accounts.insert(account_id.clone(), account);
        for user_id in user_ids {
            self.users.insert(user_id, account_id.clone());
        }
    }

    /// All accounts, ordered by id
    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.iter().map(|r| r.value().clone()).collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        accounts
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Check if no account exists
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn account_id_of(&self, user_id: &UserId) -> ManagerResult<AccountId> {
        self.users
            .get(user_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| ManagerError::UserNotFound(user_id.to_string()))
    }

    /// Run `f` against a mutable account record
    fn with_account_mut<T>(
        &self,
        account_id: &AccountId,
        f: impl FnOnce(&mut Account) -> ManagerResult<T>,
    ) -> ManagerResult<T> {
        let mut account = self
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| ManagerError::AccountNotFound(account_id.to_string()))?;
        f(account.value_mut())
    }

    fn with_setup_key_mut(
        &self,
        account_id: &AccountId,
        key_id: &str,
        f: impl FnOnce(&mut SetupKey) -> ManagerResult<()>,
    ) -> ManagerResult<SetupKey> {
        self.with_account_mut(account_id, |account| {
            let key = account
                .setup_keys
                .iter_mut()
                .find(|k| k.id == key_id)
                .ok_or_else(|| ManagerError::SetupKeyNotFound(key_id.to_string()))?;
            f(key)?;
            Ok(key.clone())
        })
    }
}

#[async_trait]
impl AccountManager for InMemoryAccountManager {
    async fn get_account_by_id(&self, account_id: &AccountId) -> ManagerResult<Account> {
        self.accounts
            .get(account_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| ManagerError::AccountNotFound(account_id.to_string()))
    }

    async fn get_account_by_user(&self, user_id: &UserId) -> ManagerResult<Account> {
        let account_id = self.account_id_of(user_id)?;
        self.get_account_by_id(&account_id).await
    }

    async fn get_or_create_account_by_user(
        &self,
        user_id: &UserId,
        domain: &str,
    ) -> ManagerResult<Account> {
        let account_id = match self.users.entry(user_id.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let account = Account::new(AccountId::generate(), user_id.clone(), domain);
                let account_id = account.id.clone();
                self.accounts.insert(account_id.clone(), account.clone());
                entry.insert(account_id.clone());
                tracing::info!(
                    "Created account {} for user {} (domain {})",
                    account_id,
                    user_id,
                    domain
                );
                return Ok(account);
            }
        };
        self.get_account_by_id(&account_id).await
    }

    async fn is_user_admin(&self, user_id: &UserId) -> ManagerResult<bool> {
        let account = self.get_account_by_user(user_id).await?;
        Ok(account.is_admin(user_id))
    }

    async fn add_setup_key(
        &self,
        account_id: &AccountId,
        name: &str,
        key_type: SetupKeyType,
        ttl: Duration,
    ) -> ManagerResult<SetupKey> {
        self.with_account_mut(account_id, |account| {
            let key = SetupKey::new(name, key_type, ttl, time::now())
                .map_err(|e| ManagerError::InvalidArgument(e.to_string()))?;
            account.setup_keys.push(key.clone());
            tracing::info!(
                "Added {} setup key {} to account {}",
                key.key_type,
                key.id,
                account.id
            );
            Ok(key)
        })
    }

    async fn rename_setup_key(
        &self,
        account_id: &AccountId,
        key_id: &str,
        name: &str,
    ) -> ManagerResult<SetupKey> {
        self.with_setup_key_mut(account_id, key_id, |key| {
            key.rename(name)
                .map_err(|e| ManagerError::InvalidArgument(e.to_string()))
        })
    }

    async fn revoke_setup_key(
        &self,
        account_id: &AccountId,
        key_id: &str,
    ) -> ManagerResult<SetupKey> {
        let key = self.with_setup_key_mut(account_id, key_id, |key| {
            key.revoke();
            Ok(())
        })?;
        tracing::info!("Revoked setup key {} of account {}", key_id, account_id);
        Ok(key)
    }

    async fn redeem_setup_key(&self, account_id: &AccountId, key: &str) -> ManagerResult<SetupKey> {
        self.with_account_mut(account_id, |account| {
            let setup_key = account
                .setup_keys
                .iter_mut()
                .find(|k| k.key() == key)
                .ok_or_else(|| ManagerError::SetupKeyNotFound("<redacted>".to_string()))?;
            setup_key
                .redeem(time::now())
                .map_err(|state| ManagerError::InvalidSetupKey {
                    id: setup_key.id.clone(),
                    state: state.to_string(),
                })?;
            tracing::debug!(
                "Setup key {} used {} times",
                setup_key.id,
                setup_key.used_times()
            );
            Ok(setup_key.clone())
        })
    }

    async fn get_peer_by_ip(&self, account_id: &AccountId, ip: IpAddr) -> ManagerResult<Peer> {
        let account = self.get_account_by_id(account_id).await?;
        account
            .peer_by_ip(ip)
            .cloned()
            .ok_or_else(|| ManagerError::PeerNotFound(ip.to_string()))
    }

    async fn update_peer(&self, account_id: &AccountId, update: PeerUpdate) -> ManagerResult<Peer> {
        self.with_account_mut(account_id, |account| {
            let peer = account
                .peers
                .iter_mut()
                .find(|p| p.key == update.key)
                .ok_or_else(|| ManagerError::PeerNotFound(update.key.clone()))?;
            peer.name = update.name;
            peer.ssh_enabled = update.ssh_enabled;
            Ok(peer.clone())
        })
    }

    async fn delete_peer(&self, account_id: &AccountId, peer_key: &str) -> ManagerResult<Peer> {
        self.with_account_mut(account_id, |account| {
            let index = account
                .peers
                .iter()
                .position(|p| p.key == peer_key)
                .ok_or_else(|| ManagerError::PeerNotFound(peer_key.to_string()))?;
            let peer = account.peers.remove(index);
            for group in account.groups.iter_mut() {
                group.peers.remove(peer_key);
            }
            tracing::info!("Deleted peer {} from account {}", peer.ip, account.id);
            Ok(peer)
        })
    }
}
