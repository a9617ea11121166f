//! twain-core: free-time computation and task placement for the Twain scheduler.
//!
//! Busy intervals + operating hours -> free intervals -> scheduled tasks.
//! Everything here is synchronous and side-effect free; fetching calendars and
//! persisting results belong to the caller.

pub mod error;
pub mod free_intervals;
pub mod hours;
pub mod interval;
pub mod scheduler;
pub mod task;
pub mod time;

pub use error::ScheduleError;
pub use free_intervals::{generate_free_intervals, FreeIntervalGenerator};
pub use hours::OperatingHours;
pub use interval::{BusyInterval, FreeInterval, Interval};
pub use scheduler::{branch_score, ScheduleSummary, TaskScheduler};
pub use task::Task;
pub use time::{format_local, local_parts, parse_local_to_utc, parse_timezone, LocalParts};
