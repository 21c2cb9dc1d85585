//! Millisecond-precision timestamps.
//!
//! All persisted times are integer milliseconds since the epoch, so every
//! in-memory timestamp is truncated to the same precision before use.

use chrono::{DateTime, Utc};

/// Current UTC time truncated to millisecond precision.
pub fn now() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis())
}

/// Convert epoch milliseconds into a UTC timestamp.
/// Out-of-range values collapse to the epoch.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert a UTC timestamp into epoch milliseconds.
pub fn to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}
