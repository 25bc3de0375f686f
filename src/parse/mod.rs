pub mod task_parser;
pub mod task_serializer;

pub use task_parser::{decode_task, parse_task_bytes, parse_tasks, DecodeError, DroppedLine};
pub use task_serializer::{encode_task, serialize_tasks};

use chrono::NaiveDateTime;

/// Separator between fields of a persisted line
pub const FIELD_DELIMITER: char = '|';

/// Number of fields in a persisted line
pub const FIELD_COUNT: usize = 5;

/// Timestamp layout written to the data file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Layout for due dates typed by a user and shown in tables
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// True if `text` cannot be persisted without corrupting the line format.
pub fn contains_delimiter(text: &str) -> bool {
    text.contains(FIELD_DELIMITER)
}

/// Parse a due date as typed on the command line: `YYYY-MM-DD HH:MM`,
/// or the persisted ISO form.
pub fn parse_due_input(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, DISPLAY_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}
