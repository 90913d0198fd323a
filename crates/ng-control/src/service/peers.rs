//! Peer operations

use std::net::IpAddr;

use ng_core::traits::PeerUpdate;
use ng_core::{AccessError, Peer};

use super::ManagementService;
use crate::auth::{AuthClaims, ScopeOverride};
use crate::projection::PeerView;

/// Requested changes to a peer; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerChanges {
    pub name: Option<String>,
    pub ssh_enabled: Option<bool>,
}

impl ManagementService {
    /// Peers of the caller's account, or of another user's account for operators
    pub async fn list_peers(
        &self,
        claims: &AuthClaims,
        user_override: Option<&str>,
    ) -> Result<Vec<PeerView>, AccessError> {
        let requested = ScopeOverride {
            account_id: None,
            user_id: user_override.map(str::to_string),
        };
        let (_, account) = self.scoped_account(claims, &requested).await?;
        tracing::debug!("Listing {} peers of account {}", account.peers.len(), account.id);
        Ok(account
            .peers
            .iter()
            .map(|peer| PeerView::new(peer, &account))
            .collect())
    }

    /// A single peer of the caller's account, addressed by IP
    pub async fn get_peer(&self, claims: &AuthClaims, peer_id: &str) -> Result<PeerView, AccessError> {
        claims.user()?;
        let ip = parse_peer_id(peer_id)?;
        let account = self.resolver.resolve(claims).await?;
        let peer = self.manager.get_peer_by_ip(&account.id, ip).await?;
        Ok(PeerView::new(&peer, &account))
    }

    /// Rename a peer or toggle its SSH flag
    pub async fn update_peer(
        &self,
        claims: &AuthClaims,
        peer_id: &str,
        changes: PeerChanges,
    ) -> Result<PeerView, AccessError> {
        claims.user()?;
        let ip = parse_peer_id(peer_id)?;
        let account = self.resolver.resolve(claims).await?;
        let peer = self.manager.get_peer_by_ip(&account.id, ip).await?;

        let name = match changes.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AccessError::InvalidArgument(
                    "peer name shouldn't be empty".to_string(),
                ))
            }
            Some(name) => name,
            None => peer.name.clone(),
        };
        let update = PeerUpdate {
            key: peer.key.clone(),
            name,
            ssh_enabled: changes.ssh_enabled.unwrap_or(peer.ssh_enabled),
        };

        let updated = self.manager.update_peer(&account.id, update).await?;
        tracing::info!("Updated peer {} of account {}", updated.ip, account.id);
        Ok(PeerView::new(&updated, &account))
    }

    /// Remove a peer from the caller's account
    pub async fn delete_peer(&self, claims: &AuthClaims, peer_id: &str) -> Result<Peer, AccessError> {
        claims.user()?;
        let ip = parse_peer_id(peer_id)?;
        let account = self.resolver.resolve(claims).await?;
        let peer = self.manager.get_peer_by_ip(&account.id, ip).await?;
        Ok(self.manager.delete_peer(&account.id, &peer.key).await?)
    }
}

fn parse_peer_id(peer_id: &str) -> Result<IpAddr, AccessError> {
    let peer_id = peer_id.trim();
    if peer_id.is_empty() {
        return Err(AccessError::InvalidArgument("invalid peer Id".to_string()));
    }
    peer_id
        .parse()
        .map_err(|_| AccessError::InvalidArgument(format!("invalid peer Id {peer_id}")))
}
