//! Absolute time ranges used for both busy and free time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Half-open range `[start, end)` of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Time the user is already committed, as reported by a calendar provider.
pub type BusyInterval = Interval;

/// Time inside one day's operating window that no busy interval touches.
pub type FreeInterval = Interval;

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(ScheduleError::MalformedInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Zero-length marker that bounds the free-time sweep at `at`.
    pub fn sentinel(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// True when `other` lies entirely within this interval.
    pub fn covers(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}
