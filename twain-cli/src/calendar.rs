use chrono::{DateTime, Utc};
use twain_core::Task;

pub struct CalendarEvent {
    pub uid: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

/// One event per scheduled task; unscheduled tasks are left out.
pub fn scheduled_to_events(tasks: &[Task]) -> Vec<CalendarEvent> {
    tasks
        .iter()
        .filter_map(|t| {
            let start = t.scheduled_time?;
            let end = t.scheduled_end()?;
            Some(CalendarEvent {
                uid: format!("twain-{}@twain", t.id),
                start_utc: start,
                end_utc: end,
                summary: t.name.clone(),
                description: format!(
                    "{}\nTaskId: {}\nDue: {}\n",
                    t.description,
                    t.id,
                    t.due_date.to_rfc3339()
                ),
            })
        })
        .collect()
}

/// Emit a minimal ICS calendar containing VEVENT blocks.
///
/// DTSTART/DTEND are UTC. UIDs derive from task ids so re-imports update
/// rather than duplicate.
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Twain//EN\n");

    for e in events {
        let dtstart = e.start_utc.format("%Y%m%dT%H%M%SZ");
        let dtend = e.end_utc.format("%Y%m%dT%H%M%SZ");

        s.push_str("BEGIN:VEVENT\n");
        s.push_str(&format!("UID:{}\n", e.uid));
        s.push_str(&format!("DTSTART:{}\n", dtstart));
        s.push_str(&format!("DTEND:{}\n", dtend));
        s.push_str(&format!("SUMMARY:{}\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\n");
    }

    s.push_str("END:VCALENDAR\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}
