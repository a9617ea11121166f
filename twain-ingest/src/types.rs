use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a busy list was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyFormat {
    /// Google Calendar `freeBusy` JSON response.
    Google,
    /// CSV with `start,end[,calendar]` columns.
    Csv,
}

/// Busy row as reported by a source, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBusy {
    pub calendar: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
