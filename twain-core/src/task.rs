//! Task model consumed and annotated by the scheduler.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A pending unit of work with a fixed duration and a hard due date.
///
/// The scheduler only ever writes `scheduled_time`; identity, duration and
/// due date belong to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,

    /// Minutes.
    pub duration_minutes: i32,

    pub due_date: DateTime<Utc>,

    /// Start of the placed block, or `None` while unscheduled / unschedulable.
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        duration_minutes: i32,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: String::new(),
            name: name.into(),
            description: String::new(),
            duration_minutes,
            due_date,
            scheduled_time: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes.into())
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_time.is_some()
    }

    /// End of the placed block.
    pub fn scheduled_end(&self) -> Option<DateTime<Utc>> {
        self.scheduled_time.map(|start| start + self.duration())
    }

    /// The placed block finishes no later than the due date. Vacuously true
    /// for unscheduled tasks.
    pub fn meets_due_date(&self) -> bool {
        self.scheduled_end().is_none_or(|end| end <= self.due_date)
    }
}
