//! Control-plane configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;

/// Default lifetime of a setup key when a request doesn't name one (30 days)
const DEFAULT_SETUP_KEY_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration for the access-control core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Domain used for new accounts when claims carry no domain hint
    pub default_domain: String,

    /// Lifetime of setup keys created without an explicit expiry (seconds)
    #[serde(with = "duration_secs")]
    pub default_setup_key_ttl: Duration,

    /// Path of the JSON account snapshot used by the admin tool
    pub state_path: PathBuf,

    /// Operator identities allowed to act on behalf of other accounts
    pub operators: OperatorsConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            default_domain: "default".to_string(),
            default_setup_key_ttl: DEFAULT_SETUP_KEY_TTL,
            state_path: super::default_config_dir().join("accounts.json"),
            operators: OperatorsConfig::default(),
        }
    }
}

impl ControlConfig {
    /// Check invariants that serde can't express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_domain.trim().is_empty() {
            return Err(ConfigError::Invalid("default_domain must not be empty".into()));
        }
        self.operators.validate()
    }
}

/// Allow-list of operator identities
///
/// A caller is an operator when its user id is listed in `users` or the
/// account it resolves to is listed in `accounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorsConfig {
    /// Operator user identifiers
    pub users: Vec<String>,
    /// Operator account identifiers
    pub accounts: Vec<String>,
}

impl OperatorsConfig {
    /// Whether no operator is configured
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.accounts.is_empty()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.users.iter().any(|u| u.trim().is_empty()) {
            return Err(ConfigError::Invalid("operators.users contains an empty entry".into()));
        }
        if self.accounts.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "operators.accounts contains an empty entry".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControlConfig::default();
        assert_eq!(config.default_domain, "default");
        assert_eq!(config.default_setup_key_ttl, DEFAULT_SETUP_KEY_TTL);
        assert!(config.operators.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ControlConfig = toml::from_str(
            r#"
            default_setup_key_ttl = 3600

            [operators]
            accounts = ["ccdq1djbkblc7398r6b0"]
            "#,
        )
        .unwrap();
        assert_eq!(config.default_domain, "default");
        assert_eq!(config.default_setup_key_ttl, Duration::from_secs(3600));
        assert!(config.operators.users.is_empty());
        assert_eq!(config.operators.accounts.len(), 1);
    }

    #[test]
    fn test_empty_operator_entry_rejected() {
        let mut config = ControlConfig::default();
        config.operators.users.push(" ".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
