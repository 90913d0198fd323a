//! ng-control: Account-scoped access control for the netgate control plane
//!
//! Resolves authenticated callers to the account they own, decides which
//! account each management operation targets, and exposes peers, setup keys
//! and users of that account through the management service. State lives in
//! an in-memory account manager that the admin tool persists as a JSON
//! snapshot.

pub mod auth;
pub mod projection;
pub mod service;
pub mod state;
pub mod store;

pub use service::ManagementService;
pub use state::ControlState;
