//! Setup keys and their lifecycle state
//!
//! A setup key is a bearer credential that lets an unregistered device
//! enroll into an account. Its state is never stored: it is derived from the
//! stored fields and the current time on every read.
//!
//! State precedence (first match wins):
//! 1. `Revoked` - the key was revoked by an administrator
//! 2. `Expired` - `now` has reached the expiry deadline
//! 3. `Overused` - a one-off key that was already redeemed
//! 4. `Valid`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AccessError;
use crate::time;
use crate::types::generate_id;

/// How many times a setup key may be redeemed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetupKeyType {
    /// Any number of enrollments until revoked or expired
    #[serde(rename = "reusable")]
    Reusable,
    /// A single enrollment
    #[serde(rename = "one-off")]
    OneOff,
}

impl SetupKeyType {
    /// Wire name of the key type
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupKeyType::Reusable => "reusable",
            SetupKeyType::OneOff => "one-off",
        }
    }
}

impl fmt::Display for SetupKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetupKeyType {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reusable" => Ok(SetupKeyType::Reusable),
            "one-off" => Ok(SetupKeyType::OneOff),
            other => Err(AccessError::InvalidArgument(format!(
                "unknown setup key type {other}"
            ))),
        }
    }
}

/// Expiry deadline of a setup key
///
/// A zero TTL produces `Never` instead of a timestamp, so a non-expiring key
/// can't be mistaken for one that is already expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// The key never expires
    Never,
    /// The key expires at this instant
    At(DateTime<Utc>),
}

impl Expiry {
    /// Convert a time-to-live into an absolute deadline
    pub fn from_ttl(now: DateTime<Utc>, ttl: Duration) -> Result<Self, AccessError> {
        if ttl.is_zero() {
            return Ok(Expiry::Never);
        }
        time::deadline_after(now, ttl)
            .map(Expiry::At)
            .ok_or_else(|| AccessError::InvalidArgument(format!("expiry {ttl:?} out of range")))
    }

    /// Whether the deadline has been reached at `now`
    pub fn is_reached(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(deadline) => now >= *deadline,
        }
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiry::Never => None,
            Expiry::At(deadline) => Some(*deadline),
        }
    }
}

/// Derived lifecycle state of a setup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupKeyState {
    Valid,
    Revoked,
    Expired,
    Overused,
}

impl SetupKeyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupKeyState::Valid => "valid",
            SetupKeyState::Revoked => "revoked",
            SetupKeyState::Expired => "expired",
            SetupKeyState::Overused => "overused",
        }
    }
}

impl fmt::Display for SetupKeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bearer credential for device enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupKey {
    pub id: String,
    /// Secret value presented by enrolling devices
    key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: SetupKeyType,
    pub expires_at: Expiry,
    revoked: bool,
    used_times: u64,
    last_used: Option<DateTime<Utc>>,
}

impl SetupKey {
    /// Create a new setup key
    ///
    /// Fails with `InvalidArgument` if the name is empty or the TTL cannot be
    /// represented as a deadline.
    pub fn new(
        name: &str,
        key_type: SetupKeyType,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, AccessError> {
        validate_name(name)?;
        Ok(Self {
            id: generate_id(),
            key: uuid::Uuid::new_v4().to_string().to_uppercase(),
            name: name.to_string(),
            key_type,
            expires_at: Expiry::from_ttl(now, ttl)?,
            revoked: false,
            used_times: 0,
            last_used: None,
        })
    }

    /// The secret value. Fixed at creation.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn used_times(&self) -> u64 {
        self.used_times
    }

    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        self.last_used
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_reached(now)
    }

    pub fn is_overused(&self) -> bool {
        self.key_type == SetupKeyType::OneOff && self.used_times >= 1
    }

    /// Derive the lifecycle state at `now`
    pub fn state(&self, now: DateTime<Utc>) -> SetupKeyState {
        if self.revoked {
            SetupKeyState::Revoked
        } else if self.is_expired(now) {
            SetupKeyState::Expired
        } else if self.is_overused() {
            SetupKeyState::Overused
        } else {
            SetupKeyState::Valid
        }
    }

    /// Whether the key may be redeemed at `now`
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == SetupKeyState::Valid
    }

    /// Change the display name. The secret is left untouched.
    pub fn rename(&mut self, name: &str) -> Result<(), AccessError> {
        validate_name(name)?;
        self.name = name.to_string();
        Ok(())
    }

    /// Revoke the key. There is no way back.
    pub fn revoke(&mut self) {
        self.revoked = true;
    }

    /// Record an enrollment made with this key
    ///
    /// Only a `Valid` key can be redeemed; otherwise the blocking state is
    /// returned and the key is left unchanged.
    pub fn redeem(&mut self, now: DateTime<Utc>) -> Result<(), SetupKeyState> {
        match self.state(now) {
            SetupKeyState::Valid => {
                self.used_times = self.used_times.saturating_add(1);
                self.last_used = Some(now);
                Ok(())
            }
            state => Err(state),
        }
    }
}

/// Derive the lifecycle state of `key` at `now`
pub fn derive_state(key: &SetupKey, now: DateTime<Utc>) -> SetupKeyState {
    key.state(now)
}

/// Whether `key` may be redeemed at `now`
pub fn is_valid(key: &SetupKey, now: DateTime<Utc>) -> bool {
    key.is_valid(now)
}

fn validate_name(name: &str) -> Result<(), AccessError> {
    if name.trim().is_empty() {
        return Err(AccessError::InvalidArgument(
            "setup key name shouldn't be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn key(key_type: SetupKeyType, ttl_secs: u64) -> SetupKey {
        SetupKey::new("office", key_type, Duration::from_secs(ttl_secs), t0()).unwrap()
    }

    #[test]
    fn test_new_key_is_valid() {
        let k = key(SetupKeyType::Reusable, 3600);
        assert_eq!(k.state(t0()), SetupKeyState::Valid);
        assert!(k.is_valid(t0()));
        assert_eq!(k.used_times(), 0);
        assert!(k.last_used().is_none());
        assert_eq!(k.key().len(), 36);
        assert_eq!(k.key(), k.key().to_uppercase());
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = SetupKey::new("  ", SetupKeyType::OneOff, Duration::ZERO, t0()).unwrap_err();
        assert!(matches!(err, AccessError::InvalidArgument(_)));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert_eq!("one-off".parse::<SetupKeyType>().unwrap(), SetupKeyType::OneOff);
        assert_eq!("reusable".parse::<SetupKeyType>().unwrap(), SetupKeyType::Reusable);
        let err = "forever".parse::<SetupKeyType>().unwrap_err();
        assert!(matches!(err, AccessError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let k = key(SetupKeyType::Reusable, 0);
        assert_eq!(k.expires_at, Expiry::Never);
        let far_future = Utc.with_ymd_and_hms(2200, 1, 1, 0, 0, 0).unwrap();
        assert!(!k.is_expired(far_future));
        assert_eq!(k.state(far_future), SetupKeyState::Valid);
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let k = key(SetupKeyType::Reusable, 60);
        let deadline = t0() + chrono::Duration::seconds(60);
        assert_eq!(k.state(deadline - chrono::Duration::seconds(1)), SetupKeyState::Valid);
        assert_eq!(k.state(deadline), SetupKeyState::Expired);
    }

    #[test]
    fn test_revoked_dominates_expired_and_overused() {
        let mut k = key(SetupKeyType::OneOff, 60);
        k.redeem(t0()).unwrap();
        k.revoke();
        let later = t0() + chrono::Duration::hours(2);
        assert_eq!(k.state(later), SetupKeyState::Revoked);
        assert_eq!(derive_state(&k, later), SetupKeyState::Revoked);
    }

    #[test]
    fn test_expired_dominates_overused() {
        let mut k = key(SetupKeyType::OneOff, 60);
        k.redeem(t0()).unwrap();
        let later = t0() + chrono::Duration::hours(2);
        assert_eq!(k.state(later), SetupKeyState::Expired);
    }

    #[test]
    fn test_one_off_overused_after_single_redemption() {
        let mut k = key(SetupKeyType::OneOff, 3600);
        assert_eq!(k.state(t0()), SetupKeyState::Valid);
        k.redeem(t0()).unwrap();
        assert_eq!(k.used_times(), 1);
        assert_eq!(k.state(t0()), SetupKeyState::Overused);
        assert!(!is_valid(&k, t0()));
        assert_eq!(k.redeem(t0()), Err(SetupKeyState::Overused));
        assert_eq!(k.used_times(), 1);
    }

    #[test]
    fn test_reusable_non_expiring_survives_many_redemptions() {
        let mut k = key(SetupKeyType::Reusable, 0);
        for i in 0..10 {
            k.redeem(t0() + chrono::Duration::minutes(i)).unwrap();
        }
        assert_eq!(k.used_times(), 10);
        assert_eq!(k.last_used(), Some(t0() + chrono::Duration::minutes(9)));
        assert_eq!(k.state(t0()), SetupKeyState::Valid);
    }

    #[test]
    fn test_rename_keeps_secret() {
        let mut k = key(SetupKeyType::Reusable, 0);
        let secret = k.key().to_string();
        k.rename("lab").unwrap();
        assert_eq!(k.name, "lab");
        assert_eq!(k.key(), secret);
        assert!(k.rename("").is_err());
        assert_eq!(k.name, "lab");
    }

    #[test]
    fn test_counters_are_monotone() {
        let mut k = key(SetupKeyType::Reusable, 3600);
        let mut last_used = k.used_times();
        let mut was_revoked = false;
        let ops = ["redeem", "rename", "redeem", "revoke", "redeem", "rename", "redeem"];
        for (i, op) in ops.iter().enumerate() {
            let now = t0() + chrono::Duration::seconds(i as i64);
            match *op {
                "redeem" => {
                    let _ = k.redeem(now);
                }
                "rename" => k.rename(&format!("key-{i}")).unwrap(),
                _ => k.revoke(),
            }
            assert!(k.used_times() >= last_used);
            assert!(!was_revoked || k.is_revoked());
            last_used = k.used_times();
            was_revoked = k.is_revoked();
        }
        assert_eq!(k.used_times(), 2);
        assert!(k.is_revoked());
    }

    #[test]
    fn test_state_is_deterministic() {
        let k = key(SetupKeyType::OneOff, 10);
        let at = t0() + chrono::Duration::seconds(5);
        assert_eq!(k.state(at), k.state(at));
    }

    #[test]
    fn test_serialized_shape() {
        let k = key(SetupKeyType::OneOff, 0);
        let json = serde_json::to_value(&k).unwrap();
        assert_eq!(json["type"], "one-off");
        assert_eq!(json["expires_at"], "never");
        assert_eq!(json["revoked"], false);
        let back: SetupKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, k);
    }
}
