//! Task list input: the unscheduled tasks a run should place.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use twain_core::Task;

/// Parse a JSON array of tasks. `scheduled_time` is cleared: a run always
/// starts from unscheduled tasks.
pub fn parse_tasks_json(json: &str) -> Result<Vec<Task>> {
    let mut tasks: Vec<Task> = serde_json::from_str(json).context("invalid task list")?;

    let mut seen = std::collections::HashSet::new();
    for t in tasks.iter_mut() {
        if !seen.insert(t.id.clone()) {
            bail!("duplicate task id: {}", t.id);
        }
        t.scheduled_time = None;
    }
    Ok(tasks)
}

pub fn load_tasks(path: impl AsRef<Path>) -> Result<Vec<Task>> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_tasks_json(&s).with_context(|| format!("parsing {}", path.display()))
}

/// Sort ascending by due date; equal due dates keep their input order.
pub fn order_by_due_date(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.due_date);
}

/// Latest due date, used as the sweep horizon.
pub fn last_due_date(tasks: &[Task]) -> Option<DateTime<Utc>> {
    tasks.iter().map(|t| t.due_date).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"[
  {"id": "1", "user_id": "u1", "name": "Essay", "description": "draft",
   "duration_minutes": 90, "due_date": "2026-02-20T17:00:00Z"},
  {"id": "2", "name": "Lab", "duration_minutes": 60,
   "due_date": "2026-02-19T12:00:00-06:00", "scheduled_time": "2026-02-19T15:00:00Z"},
  {"id": "3", "name": "Reading", "duration_minutes": 30, "due_date": "2026-02-20T17:00:00Z"}
]"#;

    #[test]
    fn test_parse_and_order() {
        let mut tasks = parse_tasks_json(SAMPLE).unwrap();
        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.scheduled_time.is_none()));

        order_by_due_date(&mut tasks);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert_eq!(
            last_due_date(&tasks),
            Some(Utc.with_ymd_and_hms(2026, 2, 20, 17, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
  {"id": "1", "name": "a", "duration_minutes": 10, "due_date": "2026-02-20T17:00:00Z"},
  {"id": "1", "name": "b", "duration_minutes": 10, "due_date": "2026-02-20T17:00:00Z"}
]"#;
        assert!(parse_tasks_json(json).is_err());
    }

    #[test]
    fn test_empty_list() {
        let tasks = parse_tasks_json("[]").unwrap();
        assert!(tasks.is_empty());
        assert_eq!(last_due_date(&tasks), None);
    }
}
