//! Clock access for event timestamps and the portal's calendar date.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Instant at which an entity changed or an event was raised.
pub type Timestamp = DateTime<Utc>;

#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current calendar date in the host's local time zone.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
