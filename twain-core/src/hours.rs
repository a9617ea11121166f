//! Daily operating hours: the local window in which tasks may be placed.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveTime, TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::error::{Result, ScheduleError};
use crate::time::{at_local_time, local_date, local_instant, local_parts, parse_timezone};

/// Per-user operating-hours configuration, immutable for a scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingHours {
    timezone: Tz,
    start: NaiveTime,
    end: NaiveTime,
    weekends_enabled: bool,
}

impl OperatingHours {
    /// Build from an IANA zone name. Unknown zones and empty or inverted
    /// windows are rejected before any sweep runs.
    pub fn new(
        timezone: &str,
        start: NaiveTime,
        end: NaiveTime,
        weekends_enabled: bool,
    ) -> Result<Self> {
        let tz = parse_timezone(timezone)?;
        Self::with_tz(tz, start, end, weekends_enabled)
    }

    pub fn with_tz(tz: Tz, start: NaiveTime, end: NaiveTime, weekends_enabled: bool) -> Result<Self> {
        // Windows are compared at minute resolution.
        let start = truncate_to_minute(start);
        let end = truncate_to_minute(end);
        if start >= end {
            return Err(ScheduleError::InvalidOperatingHours { start, end });
        }
        Ok(Self {
            timezone: tz,
            start,
            end,
            weekends_enabled,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn weekends_enabled(&self) -> bool {
        self.weekends_enabled
    }

    /// Whether `instant` falls inside `[start, end)` on an allowed day.
    pub fn is_open(&self, instant: DateTime<Utc>) -> bool {
        let parts = local_parts(instant, self.timezone);
        if parts.is_weekend() && !self.weekends_enabled {
            return false;
        }
        let minute = parts.minute_of_day();
        minute >= minute_of_day(self.start) && minute < minute_of_day(self.end)
    }

    /// Start of the next operating window strictly after `instant`.
    ///
    /// Today's window if it has not opened yet, otherwise the following
    /// allowed day. With weekends disabled Saturday jumps two days and Sunday
    /// one.
    pub fn next_open(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = local_date(instant, self.timezone);
        if local_instant(date, self.start, self.timezone) <= instant {
            date += Duration::days(1);
        }
        if !self.weekends_enabled {
            match date.weekday() {
                Weekday::Sat => date += Duration::days(2),
                Weekday::Sun => date += Duration::days(1),
                _ => {}
            }
        }
        local_instant(date, self.start, self.timezone)
    }

    /// Close of the operating window on the local calendar day of `instant`.
    ///
    /// When the closing time occurs twice (clocks going back) the earlier
    /// occurrence applies, unless `instant` has already reached it.
    pub fn close_on(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = local_date(instant, self.timezone);
        match self.timezone.from_local_datetime(&date.and_time(self.end)) {
            LocalResult::Ambiguous(early, late) if early.with_timezone(&Utc) <= instant => {
                late.with_timezone(&Utc)
            }
            _ => at_local_time(instant, self.timezone, self.end, 0),
        }
    }
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}
