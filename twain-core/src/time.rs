//! Time utilities: timezone-aware local clock readings and day boundaries.
//!
//! All instants in the core are UTC. Local wall-clock questions ("what hour is
//! it for the user", "when does tomorrow's window open") go through the IANA
//! database in `chrono-tz`; DST transitions are resolved by it.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike,
    Utc, Weekday,
};
use chrono_tz::Tz;

use crate::error::{Result, ScheduleError};

/// Parse an IANA timezone name like "America/Chicago".
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

/// Parse a local time like "2026-02-20 23:59" in `tz`, returning UTC.
///
/// Unlike day-boundary construction, user input that lands in a DST gap or
/// overlap is rejected rather than guessed.
pub fn parse_local_to_utc(local: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let ndt = NaiveDateTime::parse_from_str(local.trim(), "%Y-%m-%d %H:%M").map_err(|e| {
        ScheduleError::InvalidLocalTime {
            value: local.to_string(),
            reason: e.to_string(),
        }
    })?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| ScheduleError::InvalidLocalTime {
            value: local.to_string(),
            reason: format!("ambiguous or skipped local time in {tz} (DST?)"),
        })?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Wall-clock reading of an instant in a given zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalParts {
    pub hour: u32,
    pub minute: u32,
    pub weekday: Weekday,
}

impl LocalParts {
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday, Weekday::Sat | Weekday::Sun)
    }

    /// Minutes since local midnight, ignoring seconds.
    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

pub fn local_parts(instant: DateTime<Utc>, tz: Tz) -> LocalParts {
    let local = instant.with_timezone(&tz);
    LocalParts {
        hour: local.hour(),
        minute: local.minute(),
        weekday: local.weekday(),
    }
}

/// Calendar date of `instant` as seen in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// The instant at which the local clock in `tz` reads `time` on `date`.
///
/// Ambiguous times (clocks going back) take the earlier instant. Skipped
/// times (clocks going forward) move forward past the gap.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let ndt = date.and_time(time);
    let resolved = tz
        .from_local_datetime(&ndt)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(ndt + Duration::hours(1))).earliest());

    match resolved {
        Some(dt) => dt.with_timezone(&Utc),
        None => {
            // Gap wider than an hour: read the wall clock with the offset in
            // force at that moment.
            let offset = tz.offset_from_utc_datetime(&ndt).fix();
            Utc.from_utc_datetime(&(ndt - Duration::seconds(offset.local_minus_utc().into())))
        }
    }
}

/// Local `time` on the calendar day of `instant`, shifted by `days_ahead` days.
pub fn at_local_time(
    instant: DateTime<Utc>,
    tz: Tz,
    time: NaiveTime,
    days_ahead: u32,
) -> DateTime<Utc> {
    let date = local_date(instant, tz) + Duration::days(days_ahead.into());
    local_instant(date, time, tz)
}

/// Human-readable local rendering used in CLI output and logs.
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format("%a %Y-%m-%d %H:%M %Z")
        .to_string()
}
