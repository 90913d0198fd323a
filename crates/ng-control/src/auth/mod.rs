//! Authentication and authorization for the management surface
//!
//! Requests carry verified identity claims. The resolver turns claims into
//! an account scope (creating the account on first contact), and the scope
//! authorizer decides which account an operation really targets.

mod audit;
mod claims;
mod operators;
mod resolver;
mod scope;

pub use audit::{AuditEvent, AuditSink, MemoryAuditSink, OverrideKind, TracingAuditSink};
pub use claims::{AuthClaims, Principal};
pub use operators::{OperatorAllowList, OperatorPolicy};
pub use resolver::PrincipalResolver;
pub use scope::{ScopeAuthorizer, ScopeOverride};
