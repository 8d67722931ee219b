//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for record lifecycles, assignments, and token expiry.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert whole seconds since the Unix epoch, as carried in token claims.
#[must_use]
pub fn from_unix_seconds(seconds: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(seconds, 0)
}
