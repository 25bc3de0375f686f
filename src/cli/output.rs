use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::task::{Category, Priority, Task};
use crate::ops::search::SearchHit;
use crate::parse::{DISPLAY_FORMAT, TIMESTAMP_FORMAT};
use crate::util::unicode::fit_cell;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: Option<u64>,
    pub description: String,
    pub due: String,
    pub priority: Priority,
    pub category: Category,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    #[serde(flatten)]
    pub task: TaskJson,
    /// Byte offsets `[start, end)` of each match in the description
    pub matches: Vec<(usize, usize)>,
}

#[derive(Serialize)]
pub struct DeleteJson {
    pub id: u64,
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id(),
        description: task.description().to_string(),
        due: task.due_at().format(TIMESTAMP_FORMAT).to_string(),
        priority: task.priority(),
        category: task.category(),
    }
}

pub fn hit_to_json(hit: &SearchHit) -> SearchHitJson {
    SearchHitJson {
        task: task_to_json(&hit.task),
        matches: hit.spans.iter().map(|r| (r.start, r.end)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

const ID_WIDTH: usize = 4;
const DESCRIPTION_WIDTH: usize = 32;
const DUE_WIDTH: usize = 16;
const PRIORITY_WIDTH: usize = 8;
const CATEGORY_WIDTH: usize = 8;

fn table_rule() -> String {
    let inner = ID_WIDTH + DESCRIPTION_WIDTH + DUE_WIDTH + PRIORITY_WIDTH + CATEGORY_WIDTH + 14;
    "\u{2500}".repeat(inner + 2)
}

fn table_row(cells: [&str; 5]) -> String {
    let widths = [
        ID_WIDTH,
        DESCRIPTION_WIDTH,
        DUE_WIDTH,
        PRIORITY_WIDTH,
        CATEGORY_WIDTH,
    ];
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| fit_cell(cell, w))
        .collect();
    format!("| {} |", padded.join(" | "))
}

/// Format a task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    format!(
        "#{} {} (due {}, {}, {})",
        task.id().unwrap_or(0),
        task.description(),
        task.due_at().format(DISPLAY_FORMAT),
        task.priority(),
        task.category()
    )
}

/// Format tasks as a titled table. An empty list yields `empty_message`.
pub fn format_task_table(title: &str, tasks: &[Task], empty_message: &str) -> Vec<String> {
    if tasks.is_empty() {
        return vec![empty_message.to_string()];
    }

    let mut lines = vec![title.to_string(), table_rule()];
    lines.push(table_row(["ID", "Description", "Due", "Priority", "Category"]));
    lines.push(table_rule());
    for task in tasks {
        let id = task.id().unwrap_or(0).to_string();
        let due = task.due_at().format(DISPLAY_FORMAT).to_string();
        lines.push(table_row([
            &id,
            task.description(),
            &due,
            task.priority().label(),
            task.category().label(),
        ]));
    }
    lines.push(table_rule());
    lines
}

/// Format a recovery entry for display
pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}: {}",
        entry
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        entry.category,
        entry.description
    )];
    for (key, value) in &entry.fields {
        lines.push(format!("  {}: {}", key, value));
    }
    for body_line in entry.body.lines() {
        lines.push(format!("    {}", body_line));
    }
    lines
}
