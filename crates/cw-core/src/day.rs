//! Local calendar day boundaries.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// A local calendar day as a half-open UTC range.
///
/// `end` is one nanosecond before the next local midnight and is exclusive,
/// so the final nanosecond of the day falls outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Window for `date` in `tz`.
    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let tomorrow = date + Duration::days(1);
        Self {
            start: local_midnight_to_utc(date, tz),
            end: local_midnight_to_utc(tomorrow, tz) - Duration::nanoseconds(1),
        }
    }

    /// Window for today in the system time zone.
    pub fn today() -> Self {
        Self::for_date(Local::now().date_naive(), &Local)
    }
}

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_midnight_to_utc<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        // DST spring-forward gap at midnight: 1am local is guaranteed to exist
        .or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc))
}
