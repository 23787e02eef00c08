//! UTC timestamp helpers.
//!
//! Timestamps are stored as unix seconds and rendered as timezone-aware
//! UTC datetimes only at the payload boundary.

use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: i64 = 86400;

/// Current time as UTC unix seconds.
pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

/// Convert stored unix seconds into a timezone-aware UTC datetime.
pub fn datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Unix timestamp `days` whole days from now.
pub fn days_from_now(days: i64) -> i64 {
    now_ts() + days * SECONDS_PER_DAY
}

/// Whole days remaining until `expire_at`, floored at 0.
///
/// None means the expiry is absent (non-expiring license).
pub fn remaining_days(expire_at: Option<i64>) -> Option<i64> {
    expire_at.map(|exp| ((exp - now_ts()) / SECONDS_PER_DAY).max(0))
}
