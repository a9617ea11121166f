//! Source-specific busy-interval parsers.

pub mod busy_csv;
pub mod google_freebusy;

use std::path::Path;

use anyhow::{Context, Result};
use chrono_tz::Tz;

use crate::types::{BusyFormat, RawBusy};

/// Read a busy export in the given format. `tz` resolves CSV local times.
pub fn load_busy(path: impl AsRef<Path>, format: BusyFormat, tz: Tz) -> Result<Vec<RawBusy>> {
    let path = path.as_ref();
    match format {
        BusyFormat::Google => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            google_freebusy::parse_freebusy_json(&s)
                .with_context(|| format!("parsing {}", path.display()))
        }
        BusyFormat::Csv => busy_csv::parse_busy_csv(path, tz),
    }
}
