//! Core trait definitions

mod manager;

pub use manager::{AccountManager, ManagerResult, PeerUpdate};
