//! twain-ingest: turns exported calendar and task data into core inputs.
//!
//! Busy intervals come from a Google Calendar `freeBusy` response or a CSV
//! export; both are normalized (malformed rows dropped, sorted, overlaps
//! merged) before they reach the free-time sweep.

pub mod busy;
pub mod parsers;
pub mod tasks;
pub mod types;

pub use busy::{normalize, NormalizedBusy};
pub use parsers::load_busy;
pub use tasks::{last_due_date, load_tasks, order_by_due_date, parse_tasks_json};
pub use types::{BusyFormat, RawBusy};
