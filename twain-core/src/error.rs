//! Error type for the scheduling core.
//!
//! Only invalid input is an error. A task that cannot be placed is a normal
//! outcome and is reported through `Task::scheduled_time` being `None`.

use chrono::{DateTime, NaiveTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The timezone name is not in the IANA database.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Operating hours must open strictly before they close.
    #[error("invalid operating hours: {start} - {end}")]
    InvalidOperatingHours { start: NaiveTime, end: NaiveTime },

    #[error("malformed interval: start {start} is after end {end}")]
    MalformedInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("invalid local time '{value}': {reason}")]
    InvalidLocalTime { value: String, reason: String },

    #[error("invalid task '{id}': {reason}")]
    InvalidTask { id: String, reason: String },

    /// The placement search ran past the caller's deadline.
    #[error("placement search exceeded its deadline after {frames} frames")]
    DeadlineExceeded { frames: usize },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
