//! Task placement: branch search over free intervals.
//!
//! Tasks are taken in input order (callers pass them sorted by due date). For
//! each task every free interval that is long enough is tried at its start, in
//! start order, until one would finish past the due date. Each placement opens
//! a branch over the remaining tasks with that interval shrunk from the front.
//! A task with no feasible placement is left unscheduled and consumes nothing.
//!
//! Branches are ranked by the number of tasks placed, then by the sum of
//! `(due - start) / duration` over placed tasks. The first branch wins ties.
//!
//! The search is exhaustive and therefore exponential in the number of tasks
//! (branching factor = eligible intervals per task). Identical subproblems are
//! solved once, and the walk uses an explicit stack so depth is bounded by
//! the heap, not the thread stack. It is meant for batches of tens of tasks;
//! callers that need a bound on wall time set a deadline with
//! [`TaskScheduler::with_deadline`].

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::interval::FreeInterval;
use crate::task::Task;

/// Free interval in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Span {
    start: i64,
    end: i64,
}

impl Span {
    fn len(&self) -> i64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy)]
struct Job {
    duration: i64,
    due: i64,
}

impl Job {
    fn slack_ratio(&self, start: i64) -> f64 {
        (self.due - start) as f64 / self.duration as f64
    }
}

/// Best assignment found for a suffix of the task list.
#[derive(Debug, Clone, Default)]
struct Branch {
    /// Start per task, last task first.
    placements_rev: Vec<Option<i64>>,
    scheduled: usize,
    score: f64,
}

impl Branch {
    fn extend(mut self, job: &Job, start: Option<i64>) -> Self {
        if let Some(start) = start {
            self.scheduled += 1;
            self.score += job.slack_ratio(start);
        }
        self.placements_rev.push(start);
        self
    }

    fn beats(&self, other: &Branch) -> bool {
        self.scheduled > other.scheduled
            || (self.scheduled == other.scheduled && self.score > other.score)
    }
}

enum Step {
    Descend(Vec<Span>),
    Finish(Branch),
}

/// One level of the search: a task index and the free time left for it.
struct Frame {
    depth: usize,
    free: Vec<Span>,
    next_slot: usize,
    past_due: bool,
    placed: Option<i64>,
    tried_unscheduled: bool,
    best: Option<Branch>,
}

impl Frame {
    fn new(depth: usize, free: Vec<Span>) -> Self {
        Self {
            depth,
            free,
            next_slot: 0,
            past_due: false,
            placed: None,
            tried_unscheduled: false,
            best: None,
        }
    }

    fn absorb(&mut self, job: &Job, child: Branch) {
        let branch = child.extend(job, self.placed);
        let better = match &self.best {
            Some(best) => branch.beats(best),
            None => true,
        };
        if better {
            self.best = Some(branch);
        }
    }

    fn advance(&mut self, job: &Job) -> Step {
        while !self.past_due && self.next_slot < self.free.len() {
            let idx = self.next_slot;
            self.next_slot += 1;

            let slot = self.free[idx];
            if slot.len() < job.duration {
                continue;
            }
            if slot.start + job.duration > job.due {
                // Later slots start later still.
                self.past_due = true;
                break;
            }

            self.placed = Some(slot.start);
            return Step::Descend(consume_front(&self.free, idx, job.duration));
        }

        if self.best.is_none() && !self.tried_unscheduled {
            self.tried_unscheduled = true;
            self.placed = None;
            return Step::Descend(self.free.clone());
        }

        Step::Finish(self.best.take().unwrap_or_default())
    }
}

/// Free set after taking `duration` off the front of `free[idx]`.
fn consume_front(free: &[Span], idx: usize, duration: i64) -> Vec<Span> {
    let mut next = free.to_vec();
    if next[idx].len() == duration {
        next.remove(idx);
    } else {
        next[idx].start += duration;
    }
    next
}

#[derive(Debug, Default, Clone, Copy)]
struct SearchStats {
    frames: usize,
    reused: usize,
}

fn search(
    jobs: &[Job],
    free: Vec<Span>,
    deadline: Option<Instant>,
) -> Result<(Vec<Option<i64>>, SearchStats)> {
    let mut stats = SearchStats::default();
    if jobs.is_empty() {
        return Ok((Vec::new(), stats));
    }

    let mut solved: HashMap<(usize, Vec<Span>), Branch> = HashMap::new();
    let mut stack = vec![Frame::new(0, free)];
    let mut returned: Option<Branch> = None;
    stats.frames += 1;

    while let Some(frame) = stack.last_mut() {
        let job = &jobs[frame.depth];
        if let Some(child) = returned.take() {
            frame.absorb(job, child);
        }

        match frame.advance(job) {
            Step::Descend(free) => {
                let depth = frame.depth + 1;
                if depth == jobs.len() {
                    returned = Some(Branch::default());
                    continue;
                }
                let key = (depth, free);
                if let Some(branch) = solved.get(&key) {
                    stats.reused += 1;
                    returned = Some(branch.clone());
                    continue;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Err(ScheduleError::DeadlineExceeded {
                        frames: stats.frames,
                    });
                }
                stats.frames += 1;
                stack.push(Frame::new(key.0, key.1));
            }
            Step::Finish(branch) => {
                if let Some(done) = stack.pop() {
                    solved.insert((done.depth, done.free), branch.clone());
                }
                returned = Some(branch);
            }
        }
    }

    let mut placements = returned.map(|b| b.placements_rev).unwrap_or_default();
    placements.reverse();
    Ok((placements, stats))
}

fn ceil_secs(instant: DateTime<Utc>) -> i64 {
    let secs = instant.timestamp();
    if instant.timestamp_subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

fn to_spans(free: &[FreeInterval]) -> Vec<Span> {
    let mut spans: Vec<Span> = free
        .iter()
        .map(|iv| Span {
            start: ceil_secs(iv.start),
            end: iv.end.timestamp(),
        })
        .filter(|s| s.len() > 0)
        .collect();
    spans.sort_by_key(|s| (s.start, s.end));
    spans
}

/// Places tasks into free intervals.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskScheduler {
    deadline: Option<Instant>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the search with `DeadlineExceeded` once `deadline` passes.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Annotate `tasks` with start times drawn from `free`.
    ///
    /// Output keeps input order and identity; only `scheduled_time` changes,
    /// and is `None` for tasks that could not be placed. Tasks with a
    /// non-positive duration are rejected, and so is a search that outlives
    /// the deadline.
    pub fn schedule(&self, mut tasks: Vec<Task>, free: &[FreeInterval]) -> Result<Vec<Task>> {
        let jobs = tasks
            .iter()
            .map(|t| {
                if t.duration_minutes <= 0 {
                    return Err(ScheduleError::InvalidTask {
                        id: t.id.clone(),
                        reason: format!("duration must be positive, got {}", t.duration_minutes),
                    });
                }
                Ok(Job {
                    duration: i64::from(t.duration_minutes) * 60,
                    due: t.due_date.timestamp(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let spans = to_spans(free);
        let (placements, stats) = search(&jobs, spans, self.deadline)?;

        for (task, start) in tasks.iter_mut().zip(placements) {
            task.scheduled_time = start.and_then(|s| DateTime::from_timestamp(s, 0));
        }

        debug!(
            tasks = tasks.len(),
            free = free.len(),
            scheduled = tasks.iter().filter(|t| t.is_scheduled()).count(),
            frames = stats.frames,
            reused = stats.reused,
            "schedule search finished"
        );
        Ok(tasks)
    }
}

/// Sum of `(due - start) / duration` over scheduled tasks, the tie-break used
/// between branches that place the same number of tasks.
pub fn branch_score(tasks: &[Task]) -> f64 {
    tasks
        .iter()
        .filter_map(|t| {
            let start = t.scheduled_time?;
            let slack = (t.due_date - start).num_seconds() as f64;
            Some(slack / (f64::from(t.duration_minutes) * 60.0))
        })
        .sum()
}

/// Outcome counts for reporting "could not schedule" to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScheduleSummary {
    pub total: usize,
    pub scheduled: usize,
    pub unscheduled_ids: Vec<String>,
}

impl ScheduleSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let unscheduled_ids: Vec<String> = tasks
            .iter()
            .filter(|t| !t.is_scheduled())
            .map(|t| t.id.clone())
            .collect();
        Self {
            total: tasks.len(),
            scheduled: tasks.len() - unscheduled_ids.len(),
            unscheduled_ids,
        }
    }

    pub fn all_scheduled(&self) -> bool {
        self.unscheduled_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 19, h, m, 0).unwrap()
    }

    fn iv(start: DateTime<Utc>, end: DateTime<Utc>) -> Interval {
        Interval::new(start, end).unwrap()
    }

    fn run(tasks: Vec<Task>, free: &[Interval]) -> Vec<Task> {
        TaskScheduler::new().schedule(tasks, free).unwrap()
    }

    #[test]
    fn test_empty_task_list() {
        let free = vec![iv(at(9, 0), at(10, 0))];
        assert!(run(vec![], &free).is_empty());
    }

    #[test]
    fn test_single_task_at_interval_start() {
        let now = at(9, 0);
        let tasks = vec![Task::new("a", "A", 60, now + Duration::hours(2))];
        let out = run(tasks, &[iv(now, now + Duration::hours(3))]);
        assert_eq!(out[0].scheduled_time, Some(now));
    }

    #[test]
    fn test_task_longer_than_time_to_due_is_unschedulable() {
        let now = at(9, 0);
        let tasks = vec![Task::new("a", "A", 120, now + Duration::hours(1))];
        let out = run(tasks, &[iv(now, now + Duration::hours(3))]);
        assert_eq!(out[0].scheduled_time, None);
    }

    #[test]
    fn test_no_free_time_leaves_tasks_unscheduled() {
        let tasks = vec![
            Task::new("a", "A", 30, at(17, 0)),
            Task::new("b", "B", 30, at(17, 0)),
        ];
        let out = run(tasks, &[]);
        assert!(out.iter().all(|t| t.scheduled_time.is_none()));
    }

    #[test]
    fn test_second_task_overflows_single_interval() {
        let tasks = vec![
            Task::new("a", "A", 30, at(16, 0)),
            Task::new("b", "B", 45, at(17, 0)),
        ];
        let out = run(tasks, &[iv(at(9, 0), at(10, 0))]);
        assert_eq!(out[0].scheduled_time, Some(at(9, 0)));
        assert_eq!(out[1].scheduled_time, None);
    }

    #[test]
    fn test_second_task_uses_later_interval() {
        let tasks = vec![
            Task::new("a", "A", 30, at(16, 0)),
            Task::new("b", "B", 45, at(17, 0)),
        ];
        let out = run(tasks, &[iv(at(9, 0), at(10, 0)), iv(at(13, 0), at(14, 0))]);
        assert_eq!(out[0].scheduled_time, Some(at(9, 0)));
        assert_eq!(out[1].scheduled_time, Some(at(13, 0)));
    }

    #[test]
    fn test_prefers_branch_scheduling_more_tasks() {
        // Putting A first in the long slot would strand B.
        let tasks = vec![
            Task::new("a", "A", 30, at(17, 0)),
            Task::new("b", "B", 60, at(17, 0)),
        ];
        let out = run(tasks, &[iv(at(9, 0), at(10, 0)), iv(at(11, 0), at(11, 30))]);
        assert_eq!(out[0].scheduled_time, Some(at(11, 0)));
        assert_eq!(out[1].scheduled_time, Some(at(9, 0)));
    }

    #[test]
    fn test_ties_broken_by_slack_score() {
        // Both orders place both tasks; the short task early scores higher:
        // A@9,B@11 -> 8/1 + 6/0.5 = 20 ; A@11,B@9 -> 6/1 + 8/0.5 = 22
        let tasks = vec![
            Task::new("a", "A", 60, at(17, 0)),
            Task::new("b", "B", 30, at(17, 0)),
        ];
        let out = run(tasks, &[iv(at(9, 0), at(10, 0)), iv(at(11, 0), at(12, 0))]);
        assert_eq!(out[0].scheduled_time, Some(at(11, 0)));
        assert_eq!(out[1].scheduled_time, Some(at(9, 0)));
        assert!((branch_score(&out) - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_fit_removes_interval() {
        let tasks = vec![
            Task::new("a", "A", 60, at(17, 0)),
            Task::new("b", "B", 60, at(17, 0)),
        ];
        let out = run(tasks, &[iv(at(9, 0), at(10, 0)), iv(at(12, 0), at(13, 0))]);
        let mut starts: Vec<_> = out.iter().map(|t| t.scheduled_time.unwrap()).collect();
        starts.sort();
        assert_eq!(starts, vec![at(9, 0), at(12, 0)]);
    }

    #[test]
    fn test_unschedulable_task_consumes_nothing() {
        let tasks = vec![
            Task::new("late", "Too long", 240, at(12, 0)),
            Task::new("b", "B", 60, at(17, 0)),
        ];
        let out = run(tasks, &[iv(at(9, 0), at(10, 0))]);
        assert_eq!(out[0].scheduled_time, None);
        assert_eq!(out[1].scheduled_time, Some(at(9, 0)));
    }

    #[test]
    fn test_deadline_check_skips_short_slots_first() {
        // The first slot is too short; the second is feasible.
        let tasks = vec![Task::new("a", "A", 60, at(12, 0))];
        let out = run(tasks, &[iv(at(9, 0), at(9, 30)), iv(at(10, 0), at(11, 0))]);
        assert_eq!(out[0].scheduled_time, Some(at(10, 0)));
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let tasks = vec![Task::new("zero", "Nothing", 0, at(17, 0))];
        let err = TaskScheduler::new()
            .schedule(tasks, &[iv(at(9, 0), at(10, 0))])
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTask { ref id, .. } if id == "zero"));
    }

    #[test]
    fn test_preserves_identity_fields() {
        let due = at(17, 0);
        let tasks = vec![Task::new("a", "A", 30, due)
            .with_user("u1")
            .with_description("desc")];
        let out = run(tasks.clone(), &[iv(at(9, 0), at(10, 0))]);
        assert_eq!(out[0].id, tasks[0].id);
        assert_eq!(out[0].user_id, "u1");
        assert_eq!(out[0].description, "desc");
        assert_eq!(out[0].due_date, due);
        assert_eq!(out[0].duration_minutes, 30);
    }

    #[test]
    fn test_subsecond_interval_start_rounds_up() {
        let start = at(9, 0) + Duration::milliseconds(250);
        let tasks = vec![Task::new("a", "A", 30, at(17, 0))];
        let out = run(tasks, &[iv(start, at(10, 0))]);
        assert_eq!(out[0].scheduled_time, Some(at(9, 0) + Duration::seconds(1)));
    }

    #[test]
    fn test_deep_batch_does_not_overflow_stack() {
        // Task i fits only slot i: earlier slots are too short and later ones
        // would finish past its due date.
        let n = 1_000;
        let base = at(0, 0);
        let slot_start = |i: i64| base + Duration::minutes(i * 1_100);
        let free: Vec<Interval> = (0..n)
            .map(|i| iv(slot_start(i), slot_start(i) + Duration::minutes(i + 1)))
            .collect();
        let tasks: Vec<Task> = (0..n)
            .map(|i| {
                let due = slot_start(i) + Duration::minutes(i + 1);
                Task::new(format!("t{i}"), "t", (i + 1) as i32, due)
            })
            .collect();
        let out = run(tasks, &free);
        assert!(out.iter().all(|t| t.is_scheduled()));
        assert_eq!(out[n as usize - 1].scheduled_time, Some(slot_start(n - 1)));
    }

    #[test]
    fn test_summary_lists_unscheduled() {
        let tasks = vec![
            Task::new("a", "A", 30, at(16, 0)),
            Task::new("b", "B", 45, at(17, 0)),
        ];
        let out = run(tasks, &[iv(at(9, 0), at(10, 0))]);
        let summary = ScheduleSummary::from_tasks(&out);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.scheduled, 1);
        assert_eq!(summary.unscheduled_ids, vec!["b".to_string()]);
        assert!(!summary.all_scheduled());
    }

    fn branching_batch() -> (Vec<Task>, Vec<Interval>) {
        let tasks = (0..3)
            .map(|i| Task::new(format!("t{i}"), "work", 30, at(17, 0)))
            .collect();
        let free = (0..4)
            .map(|i| iv(at(9 + i, 0), at(9 + i, 30)))
            .collect();
        (tasks, free)
    }

    #[test]
    fn test_expired_deadline_abandons_search() {
        let (tasks, free) = branching_batch();
        let err = TaskScheduler::new()
            .with_deadline(Instant::now())
            .schedule(tasks, &free)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::DeadlineExceeded { .. }));
    }

    #[test]
    fn test_distant_deadline_does_not_change_result() {
        let (tasks, free) = branching_batch();
        let bounded = TaskScheduler::new()
            .with_deadline(Instant::now() + std::time::Duration::from_secs(60))
            .schedule(tasks.clone(), &free)
            .unwrap();
        assert_eq!(bounded, run(tasks, &free));
    }
}
