//! Time utilities for netgate
//!
//! All stored timestamps are UTC. Lifecycle decisions take `now` as an
//! explicit argument so callers (and tests) control the clock.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Current wall-clock time in UTC.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Absolute deadline `ttl` after `now`.
///
/// Returns `None` when the result is not representable.
pub fn deadline_after(now: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl).ok()?;
    now.checked_add_signed(ttl)
}
