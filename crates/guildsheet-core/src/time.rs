//! Timestamps written to the `first_created` and `last_updated` columns.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};

/// Layout of every timestamp cell, e.g. `2024/03/09 07:05:00`.
pub const SHEET_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Formats a datetime in its own time zone using [`SHEET_TIMESTAMP_FORMAT`].
pub fn sheet_timestamp<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    dt.format(SHEET_TIMESTAMP_FORMAT).to_string()
}

/// Source of the current time for row timestamps.
pub trait Clock: Send + Sync {
    /// The current time, already formatted for a sheet cell.
    fn timestamp(&self) -> String;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        sheet_timestamp(&Local::now())
    }
}

/// A clock that always reports the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock(String);

impl FixedClock {
    pub fn new<Tz>(dt: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self(sheet_timestamp(&dt))
    }
}

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.0.clone()
    }
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Returns the default wall clock as a shared handle.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDateTime, Utc};

    #[test]
    fn formats_with_zero_padding() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(sheet_timestamp(&dt), "2024/03/09 07:05:00");
    }

    #[test]
    fn formats_in_own_offset() {
        let taipei = FixedOffset::east_opt(8 * 3600).unwrap();
        let dt = Utc
            .with_ymd_and_hms(2024, 12, 31, 20, 0, 0)
            .unwrap()
            .with_timezone(&taipei);
        assert_eq!(sheet_timestamp(&dt), "2025/01/01 04:00:00");
    }

    #[test]
    fn fixed_clock_repeats() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(clock.timestamp(), "2024/01/02 03:04:05");
        assert_eq!(clock.timestamp(), clock.timestamp());
    }

    #[test]
    fn system_clock_matches_layout() {
        let stamp = system_clock().timestamp();
        assert!(NaiveDateTime::parse_from_str(&stamp, SHEET_TIMESTAMP_FORMAT).is_ok());
    }
}
