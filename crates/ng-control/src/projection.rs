//! Read-only projections of account data handed to callers

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use ng_core::{Account, Peer, SetupKey, SetupKeyState, SetupKeyType};

/// A group a peer belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    /// Total number of peers in the group
    pub member_count: usize,
}

/// Groups of `account` that contain `peer`, in the account's group order
///
/// A group id seen twice is only reported once.
pub fn groups_for_peer(account: &Account, peer: &Peer) -> Vec<GroupSummary> {
    let mut seen = HashSet::new();
    account
        .groups
        .iter()
        .filter(|group| seen.insert(group.id.as_str()))
        .filter(|group| group.contains(&peer.key))
        .map(|group| GroupSummary {
            id: group.id.clone(),
            name: group.name.clone(),
            member_count: group.peers.len(),
        })
        .collect()
}

/// A peer as presented to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerView {
    /// Peers are addressed by IP
    pub id: String,
    pub name: String,
    pub ip: String,
    pub connected: bool,
    pub last_seen: DateTime<Utc>,
    /// Operating system and core version
    pub os: String,
    pub version: String,
    pub groups: Vec<GroupSummary>,
    pub ssh_enabled: bool,
    pub key: String,
}

impl PeerView {
    pub fn new(peer: &Peer, account: &Account) -> Self {
        let ip = peer.ip.to_string();
        Self {
            id: ip.clone(),
            name: peer.name.clone(),
            ip,
            connected: peer.status.connected,
            last_seen: peer.status.last_seen,
            os: format!("{} {}", peer.meta.os, peer.meta.core),
            version: peer.meta.version.clone(),
            groups: groups_for_peer(account, peer),
            ssh_enabled: peer.ssh_enabled,
            key: peer.key.clone(),
        }
    }
}

/// A setup key as presented to callers, with its state derived at read time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupKeyView {
    pub id: String,
    pub key: String,
    pub name: String,
    /// `None` for keys that never expire
    pub expires: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub key_type: SetupKeyType,
    pub valid: bool,
    pub revoked: bool,
    pub used_times: u64,
    pub last_used: Option<DateTime<Utc>>,
    pub state: SetupKeyState,
}

impl SetupKeyView {
    pub fn new(key: &SetupKey, now: DateTime<Utc>) -> Self {
        let state = key.state(now);
        Self {
            id: key.id.clone(),
            key: key.key().to_string(),
            name: key.name.clone(),
            expires: key.expires_at.deadline(),
            key_type: key.key_type,
            valid: state == SetupKeyState::Valid,
            revoked: key.is_revoked(),
            used_times: key.used_times(),
            last_used: key.last_used(),
            state,
        }
    }
}
