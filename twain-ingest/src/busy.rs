//! Busy-interval normalization ahead of the free-time sweep.

use tracing::{debug, warn};
use twain_core::{BusyInterval, Interval};

use crate::types::RawBusy;

/// Sorted, non-overlapping busy intervals plus how many rows were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBusy {
    pub intervals: Vec<BusyInterval>,
    pub rejected: usize,
}

/// Drop rows whose start is after their end, sort by start, and merge rows
/// that overlap or touch.
pub fn normalize(raw: Vec<RawBusy>) -> NormalizedBusy {
    let mut rejected = 0;
    let mut valid: Vec<BusyInterval> = Vec::with_capacity(raw.len());

    for row in raw {
        match Interval::new(row.start, row.end) {
            Ok(iv) => valid.push(iv),
            Err(e) => {
                warn!(calendar = %row.calendar, "skipping busy row: {e}");
                rejected += 1;
            }
        }
    }

    valid.sort_by_key(|iv| (iv.start, iv.end));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(valid.len());
    for iv in valid {
        match merged.last_mut() {
            Some(last) if iv.start <= last.end => {
                last.end = last.end.max(iv.end);
            }
            _ => merged.push(iv),
        }
    }

    debug!(busy = merged.len(), rejected, "normalized busy intervals");
    NormalizedBusy {
        intervals: merged,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 19, h, m, 0).unwrap()
    }

    fn raw(start: DateTime<Utc>, end: DateTime<Utc>) -> RawBusy {
        RawBusy {
            calendar: "primary".to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_sorts_and_merges_overlaps() {
        let out = normalize(vec![
            raw(at(13, 0), at(14, 0)),
            raw(at(9, 0), at(10, 0)),
            raw(at(9, 30), at(11, 0)),
            raw(at(11, 0), at(11, 30)),
        ]);
        assert_eq!(out.rejected, 0);
        assert_eq!(
            out.intervals,
            vec![
                Interval::new(at(9, 0), at(11, 30)).unwrap(),
                Interval::new(at(13, 0), at(14, 0)).unwrap(),
            ]
        );
    }

    #[test]
    fn test_contained_interval_does_not_shrink_outer() {
        let out = normalize(vec![raw(at(9, 0), at(12, 0)), raw(at(10, 0), at(10, 30))]);
        assert_eq!(out.intervals, vec![Interval::new(at(9, 0), at(12, 0)).unwrap()]);
    }

    #[test]
    fn test_rejects_reversed_rows() {
        let out = normalize(vec![raw(at(10, 0), at(9, 0)), raw(at(11, 0), at(12, 0))]);
        assert_eq!(out.rejected, 1);
        assert_eq!(out.intervals.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(vec![]), NormalizedBusy::default());
    }
}
