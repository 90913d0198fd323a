//! ng-core: Core domain types and configuration for netgate
//!
//! This crate provides the account model, the setup-key lifecycle, the
//! error taxonomy and the account manager capability shared by the control
//! core and its tooling.

pub mod config;
pub mod error;
pub mod setup_key;
pub mod time;
pub mod traits;
pub mod types;

pub use error::{AccessError, ConfigError, ManagerError};
pub use setup_key::{Expiry, SetupKey, SetupKeyState, SetupKeyType};
pub use types::{Account, AccountId, Group, Peer, PeerMeta, PeerStatus, User, UserId, UserRole};
