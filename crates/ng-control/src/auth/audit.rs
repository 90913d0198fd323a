//! Structured audit signal for scope overrides
//!
//! An override produces one event: granted when an operator retargets an
//! operation, ignored when an ordinary caller asks for one. Ignored
//! overrides are not errors, so this signal is the only place they become
//! visible.

use serde::Serialize;
use std::sync::Mutex;

use ng_core::{AccountId, UserId};

/// What an override was resolved through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    /// Target account resolved (or created) for a user
    User,
    /// Target account named directly
    Account,
}

/// A scope override decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// An operator retargeted an operation to another account
    OverrideGranted {
        operator: UserId,
        operator_account: AccountId,
        target_account: AccountId,
        via: OverrideKind,
    },
    /// A non-operator asked for an override; the caller's own scope was used
    OverrideIgnored {
        user_id: UserId,
        account_id: AccountId,
        requested_account: Option<String>,
        requested_user: Option<String>,
    },
}

/// Receives audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits audit events as structured tracing records under the `audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match &event {
            AuditEvent::OverrideGranted {
                operator,
                operator_account,
                target_account,
                via,
            } => tracing::info!(
                target: "audit",
                event = "override_granted",
                operator = %operator,
                operator_account = %operator_account,
                target_account = %target_account,
                via = ?via,
                "scope override granted"
            ),
            AuditEvent::OverrideIgnored {
                user_id,
                account_id,
                requested_account,
                requested_user,
            } => tracing::warn!(
                target: "audit",
                event = "override_ignored",
                user_id = %user_id,
                account_id = %account_id,
                requested_account = ?requested_account,
                requested_user = ?requested_user,
                "scope override ignored for non-operator"
            ),
        }
    }
}

/// Keeps audit events in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        let ignored = AuditEvent::OverrideIgnored {
            user_id: UserId::new("alice"),
            account_id: AccountId::new("a1"),
            requested_account: Some("a2".into()),
            requested_user: None,
        };
        let granted = AuditEvent::OverrideGranted {
            operator: UserId::new("ops"),
            operator_account: AccountId::new("a0"),
            target_account: AccountId::new("a2"),
            via: OverrideKind::Account,
        };
        sink.record(ignored.clone());
        sink.record(granted.clone());
        assert_eq!(sink.events(), vec![ignored, granted]);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = AuditEvent::OverrideGranted {
            operator: UserId::new("ops"),
            operator_account: AccountId::new("a0"),
            target_account: AccountId::new("a2"),
            via: OverrideKind::User,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "override_granted");
        assert_eq!(json["via"], "user");
        assert_eq!(json["target_account"], "a2");
    }
}
