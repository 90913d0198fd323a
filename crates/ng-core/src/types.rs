//! Core domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

use crate::setup_key::SetupKey;

/// Length of generated identifiers in bytes (before hex encoding)
const ID_BYTES: usize = 10;

/// Generate a random identifier for accounts, groups and setup keys
///
/// Returns a 20-character lowercase hex string.
pub fn generate_id() -> String {
    use rand::Rng;
    let mut bytes = [0u8; ID_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Unique identifier for an account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Create a new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a fresh random account ID
    pub fn generate() -> Self {
        Self(generate_id())
    }

    /// Get the raw ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Stable identifier of an authenticated user (the identity provider subject)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role of a user inside its account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// May administer the account
    Admin,
    /// Regular member
    User,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
        }
    }
}

/// A user bound to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: UserRole,
}

/// Connectivity status reported for a peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStatus {
    /// Whether the peer currently holds a session with the management service
    pub connected: bool,
    /// Last time the peer was seen
    pub last_seen: DateTime<Utc>,
}

/// Agent metadata reported by a peer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMeta {
    /// Operating system name
    pub os: String,
    /// Kernel or core version
    pub core: String,
    /// Agent version
    pub version: String,
}

/// A network device, identified by its public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// WireGuard public key
    pub key: String,
    /// Address assigned inside the account network
    pub ip: IpAddr,
    pub name: String,
    pub ssh_enabled: bool,
    pub status: PeerStatus,
    pub meta: PeerMeta,
}

/// A named set of peer keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Member peer keys
    #[serde(default)]
    pub peers: BTreeSet<String>,
}

impl Group {
    /// Whether the peer key is a member of this group
    pub fn contains(&self, peer_key: &str) -> bool {
        self.peers.contains(peer_key)
    }
}

/// The isolation boundary owning peers, groups, setup keys and users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Domain hint the account was created for
    pub domain: String,
    /// User that caused the account to be created
    pub created_by: UserId,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub peers: Vec<Peer>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub setup_keys: Vec<SetupKey>,
}

impl Account {
    /// Create an empty account owned by `user_id`, who becomes its admin
    pub fn new(id: AccountId, user_id: UserId, domain: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
            users: vec![User {
                id: user_id.clone(),
                role: UserRole::Admin,
            }],
            created_by: user_id,
            peers: Vec::new(),
            groups: Vec::new(),
            setup_keys: Vec::new(),
        }
    }

    /// Find a user of this account
    pub fn user(&self, user_id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == user_id)
    }

    /// Whether the user is an admin of this account
    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.user(user_id)
            .map(|u| u.role == UserRole::Admin)
            .unwrap_or(false)
    }

    /// Find a peer by its key
    pub fn peer(&self, key: &str) -> Option<&Peer> {
        self.peers.iter().find(|p| p.key == key)
    }

    /// Find a peer by its network address
    pub fn peer_by_ip(&self, ip: IpAddr) -> Option<&Peer> {
        self.peers.iter().find(|p| p.ip == ip)
    }

    /// Find a setup key by its identifier
    pub fn setup_key(&self, key_id: &str) -> Option<&SetupKey> {
        self.setup_keys.iter().find(|k| k.id == key_id)
    }
}
