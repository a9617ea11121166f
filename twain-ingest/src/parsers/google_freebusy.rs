//! Google Calendar `freeBusy` response parser.
//!
//! Expected shape (only the fields used here):
//!   {"calendars": {"me@example.com": {"busy": [{"start": "...", "end": "..."}]}}}
//!
//! Calendars that report `errors` (not found, no access) carry no busy data
//! and are skipped.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::types::RawBusy;

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: BTreeMap<String, CalendarBusy>,
}

#[derive(Debug, Deserialize)]
struct CalendarBusy {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
    #[serde(default)]
    errors: Vec<CalendarError>,
}

#[derive(Debug, Deserialize)]
struct BusyPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CalendarError {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    reason: String,
}

/// Flatten every calendar's busy periods, in calendar-id order.
pub fn parse_freebusy_json(json: &str) -> Result<Vec<RawBusy>> {
    let resp: FreeBusyResponse =
        serde_json::from_str(json).context("invalid freeBusy response")?;

    let mut out = Vec::new();
    for (calendar, entry) in resp.calendars {
        if !entry.errors.is_empty() {
            for e in &entry.errors {
                warn!(%calendar, domain = %e.domain, reason = %e.reason, "calendar skipped");
            }
            continue;
        }
        out.extend(entry.busy.into_iter().map(|p| RawBusy {
            calendar: calendar.clone(),
            start: p.start,
            end: p.end,
        }));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_multiple_calendars() {
        let json = r#"{
  "kind": "calendar#freeBusy",
  "timeMin": "2026-02-19T00:00:00.000Z",
  "timeMax": "2026-02-20T00:00:00.000Z",
  "calendars": {
    "work@example.com": {
      "busy": [
        {"start": "2026-02-19T15:00:00-06:00", "end": "2026-02-19T16:00:00-06:00"}
      ]
    },
    "home@example.com": {
      "busy": [
        {"start": "2026-02-19T14:00:00Z", "end": "2026-02-19T14:30:00Z"},
        {"start": "2026-02-19T18:00:00Z", "end": "2026-02-19T19:00:00Z"}
      ]
    }
  }
}"#;
        let rows = parse_freebusy_json(json).unwrap();
        assert_eq!(rows.len(), 3);
        // BTreeMap order: home before work.
        assert_eq!(rows[0].calendar, "home@example.com");
        assert_eq!(rows[2].calendar, "work@example.com");
        assert_eq!(rows[2].start, Utc.with_ymd_and_hms(2026, 2, 19, 21, 0, 0).unwrap());
    }

    #[test]
    fn test_calendar_with_errors_is_skipped() {
        let json = r#"{
  "calendars": {
    "gone@example.com": {
      "errors": [{"domain": "global", "reason": "notFound"}],
      "busy": []
    },
    "me@example.com": {
      "busy": [{"start": "2026-02-19T14:00:00Z", "end": "2026-02-19T15:00:00Z"}]
    }
  }
}"#;
        let rows = parse_freebusy_json(json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].calendar, "me@example.com");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_freebusy_json("not json").is_err());
        assert!(parse_freebusy_json(r#"{"calendars": {"x": {"busy": [{"start": "soon"}]}}}"#).is_err());
    }
}
