//! Free-time generation: one forward sweep over sorted busy intervals,
//! clipped to each day's operating window.

use chrono::{DateTime, NaiveTime, Utc};
use tracing::{debug, trace};

use crate::error::Result;
use crate::hours::OperatingHours;
use crate::interval::{BusyInterval, FreeInterval, Interval};

#[derive(Debug, Clone)]
pub struct FreeIntervalGenerator {
    hours: OperatingHours,
}

impl FreeIntervalGenerator {
    pub fn new(hours: OperatingHours) -> Self {
        Self { hours }
    }

    /// Sweep from `start_time` across `busy` (sorted ascending by start).
    ///
    /// The sweep only moves while busy intervals remain, so the last busy
    /// interval bounds the output; an empty `busy` yields nothing. Use
    /// [`generate_until`](Self::generate_until) to bound it explicitly.
    pub fn generate(&self, start_time: DateTime<Utc>, busy: &[BusyInterval]) -> Vec<FreeInterval> {
        let mut free = Vec::new();
        let mut current = start_time;
        let mut i = 0;

        while i < busy.len() {
            let next = busy[i];

            if !self.hours.is_open(current) {
                current = self.hours.next_open(current);
            } else if next.end <= current {
                // Already behind the cursor (overlap with an earlier one, or a sentinel).
                i += 1;
            } else if next.contains(current) {
                current = next.end;
                i += 1;
            } else {
                let end_of_day = self.hours.close_on(current);
                let stop = next.start.min(end_of_day);
                if stop <= current {
                    // Close resolved before the cursor across a DST fold.
                    current = self.hours.next_open(current);
                    continue;
                }

                trace!(start = %current, end = %stop, "free interval");
                free.push(Interval {
                    start: current,
                    end: stop,
                });
                // If the day closed first, `next` is reconsidered in a later
                // window; otherwise the cursor lands on it and the busy branch
                // above consumes it.
                current = stop;
            }
        }

        debug!(
            busy = busy.len(),
            free = free.len(),
            "generated free intervals"
        );
        free
    }

    /// Like [`generate`](Self::generate), bounded by a zero-length sentinel at
    /// `horizon`. Busy intervals starting at or after the horizon are ignored,
    /// so an empty `busy` yields every operating window up to the horizon.
    pub fn generate_until(
        &self,
        start_time: DateTime<Utc>,
        horizon: DateTime<Utc>,
        busy: &[BusyInterval],
    ) -> Vec<FreeInterval> {
        let mut bounded: Vec<BusyInterval> = busy
            .iter()
            .copied()
            .filter(|b| b.start < horizon)
            .collect();
        bounded.push(Interval::sentinel(horizon));
        self.generate(start_time, &bounded)
    }
}

/// Flat entry point: validates the zone and window, then sweeps.
pub fn generate_free_intervals(
    start_time: DateTime<Utc>,
    timezone: &str,
    op_hours_start: NaiveTime,
    op_hours_end: NaiveTime,
    weekends_enabled: bool,
    busy: &[BusyInterval],
) -> Result<Vec<FreeInterval>> {
    let hours = OperatingHours::new(timezone, op_hours_start, op_hours_end, weekends_enabled)?;
    Ok(FreeIntervalGenerator::new(hours).generate(start_time, busy))
}
