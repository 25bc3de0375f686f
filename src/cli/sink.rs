use std::io::Write;

use serde::Serialize;

use crate::cli::output::{task_to_json, TaskJson};
use crate::model::task::Task;
use crate::ops::scheduler::{reminder_message, ReminderKind, ReminderSink};

#[derive(Serialize)]
struct ReminderJson {
    kind: &'static str,
    message: String,
    task: TaskJson,
}

/// Prints reminders to stdout, one line each.
pub struct ConsoleSink {
    json: bool,
}

impl ConsoleSink {
    pub fn new(json: bool) -> Self {
        ConsoleSink { json }
    }

    fn render(&self, task: &Task, kind: ReminderKind) -> String {
        let message = reminder_message(task, kind);
        if !self.json {
            return message;
        }
        let kind = match kind {
            ReminderKind::DueSoon => "due_soon",
            ReminderKind::DueNow => "due_now",
        };
        let payload = ReminderJson {
            kind,
            message,
            task: task_to_json(task),
        };
        serde_json::to_string(&payload).unwrap_or_default()
    }
}

impl ReminderSink for ConsoleSink {
    fn on_reminder(&self, task: &Task, kind: ReminderKind) {
        let line = self.render(task, kind);
        let mut stdout = std::io::stdout().lock();
        // A closed stdout only loses the notification
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}
