//! Operator identification
//!
//! An operator may act on behalf of any account. Who counts as an operator is
//! decided by an injected policy; the stock policy is an allow-list loaded
//! from configuration.

use std::collections::HashSet;

use ng_core::config::OperatorsConfig;
use ng_core::{AccountId, UserId};

use super::Principal;

/// Decides whether a principal holds the operator role
pub trait OperatorPolicy: Send + Sync {
    fn is_operator(&self, principal: &Principal) -> bool;
}

impl<F> OperatorPolicy for F
where
    F: Fn(&Principal) -> bool + Send + Sync,
{
    fn is_operator(&self, principal: &Principal) -> bool {
        self(principal)
    }
}

/// Operator policy backed by configured user and account identifiers
#[derive(Debug, Clone, Default)]
pub struct OperatorAllowList {
    users: HashSet<UserId>,
    accounts: HashSet<AccountId>,
}

impl OperatorAllowList {
    /// An allow-list granting nobody
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[operators]` configuration table
    pub fn from_config(config: &OperatorsConfig) -> Self {
        if config.is_empty() {
            return Self::new();
        }
        Self {
            users: config.users.iter().map(|u| UserId::new(u.trim())).collect(),
            accounts: config
                .accounts
                .iter()
                .map(|a| AccountId::new(a.trim()))
                .collect(),
        }
    }

    /// Grant the operator role to a user
    pub fn allow_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.users.insert(user_id.into());
        self
    }

    /// Grant the operator role to every principal of an account
    pub fn allow_account(mut self, account_id: impl Into<AccountId>) -> Self {
        self.accounts.insert(account_id.into());
        self
    }

    pub fn len(&self) -> usize {
        self.users.len() + self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.accounts.is_empty()
    }
}

impl OperatorPolicy for OperatorAllowList {
    fn is_operator(&self, principal: &Principal) -> bool {
        self.users.contains(&principal.user_id) || self.accounts.contains(&principal.account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(user: &str, account: &str) -> Principal {
        Principal {
            user_id: UserId::new(user),
            account_id: AccountId::new(account),
            is_admin: true,
        }
    }

    #[test]
    fn test_empty_allow_list_grants_nobody() {
        let policy = OperatorAllowList::new();
        assert!(policy.is_empty());
        assert!(!policy.is_operator(&principal("root", "acc")));
    }

    #[test]
    fn test_empty_operators_table() {
        let config = OperatorsConfig::default();
        assert!(config.is_empty());
        let policy = OperatorAllowList::from_config(&config);
        assert!(policy.is_empty());
        assert!(!policy.is_operator(&principal("root", "acc")));
    }

    #[test]
    fn test_allow_list_matches_user_or_account() {
        let policy = OperatorAllowList::new()
            .allow_user("ops-bot")
            .allow_account("ops-account");
        assert_eq!(policy.len(), 2);
        assert!(policy.is_operator(&principal("ops-bot", "any")));
        assert!(policy.is_operator(&principal("someone", "ops-account")));
        assert!(!policy.is_operator(&principal("someone", "other")));
    }

    #[test]
    fn test_from_config() {
        let config = OperatorsConfig {
            users: vec![" ops-bot ".to_string()],
            accounts: vec![],
        };
        let policy = OperatorAllowList::from_config(&config);
        assert!(policy.is_operator(&principal("ops-bot", "acc")));
    }

    #[test]
    fn test_closure_policy() {
        let policy = |p: &Principal| p.is_admin && p.user_id.as_str().starts_with("svc-");
        assert!(policy.is_operator(&principal("svc-sync", "acc")));
        assert!(!policy.is_operator(&principal("alice", "acc")));
    }
}
