//! CSV busy export parser.
//!
//! Header row required:
//!   start,end[,calendar]
//! Times are RFC3339 (`2026-02-19T09:00:00-06:00`) or local `YYYY-MM-DD HH:MM`
//! in the caller's zone.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use twain_core::parse_local_to_utc;

use crate::types::RawBusy;

#[derive(Debug, Deserialize)]
struct CsvRow {
    start: String,
    end: String,
    #[serde(default)]
    calendar: Option<String>,
}

fn parse_time(value: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    Ok(parse_local_to_utc(value, tz)?)
}

pub fn parse_busy_csv(path: impl AsRef<Path>, tz: Tz) -> Result<Vec<RawBusy>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("opening {}", path.as_ref().display()))?;
    parse_busy_csv_reader(file, tz).with_context(|| format!("parsing {}", path.as_ref().display()))
}

pub fn parse_busy_csv_reader<R: Read>(reader: R, tz: Tz) -> Result<Vec<RawBusy>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut out = Vec::new();
    for (i, result) in rdr.deserialize::<CsvRow>().enumerate() {
        // Line 1 is the header.
        let line = i + 2;
        let row = result.with_context(|| format!("line {line}"))?;
        let start = parse_time(&row.start, tz).with_context(|| format!("line {line}: start"))?;
        let end = parse_time(&row.end, tz).with_context(|| format!("line {line}: end"))?;
        out.push(RawBusy {
            calendar: row
                .calendar
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "csv".to_string()),
            start,
            end,
        });
    }
    Ok(out)
}
