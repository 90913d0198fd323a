//! JSON snapshots of the in-memory account store

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ng_core::Account;

use super::InMemoryAccountManager;

/// Serialized form of every account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Load a manager from a snapshot file
///
/// A missing file yields an empty manager.
pub fn load_snapshot(path: &Path) -> Result<InMemoryAccountManager> {
    if !path.exists() {
        tracing::info!("No account snapshot at {:?}, starting empty", path);
        return Ok(InMemoryAccountManager::new());
    }

    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let snapshot: AccountSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse account snapshot {:?}", path))?;

    tracing::info!(
        "Loaded {} accounts from {:?}",
        snapshot.accounts.len(),
        path
    );
    Ok(InMemoryAccountManager::with_accounts(snapshot.accounts))
}

/// Write every account of the manager to a snapshot file
pub fn save_snapshot(path: &Path, manager: &InMemoryAccountManager) -> Result<()> {
    let snapshot = AccountSnapshot {
        accounts: manager.accounts(),
    };
    let content =
        serde_json::to_string_pretty(&snapshot).context("Failed to serialize account snapshot")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

    tracing::debug!("Saved {} accounts to {:?}", snapshot.accounts.len(), path);
    Ok(())
}
