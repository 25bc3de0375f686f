use chrono::NaiveDateTime;

use crate::model::task::{Category, Priority, Task};
use crate::parse::{FIELD_COUNT, FIELD_DELIMITER};

/// Error type for a single persisted line that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected {FIELD_COUNT} fields, found {0}")]
    FieldCount(usize),
    #[error("invalid task id '{0}'")]
    InvalidId(String),
    #[error("empty description")]
    EmptyDescription,
    #[error("invalid due timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("invalid priority '{0}'")]
    InvalidPriority(String),
    #[error("unknown task category '{0}'")]
    UnknownCategory(String),
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// A line dropped while parsing a data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedLine {
    /// 1-based line number in the source
    pub line_no: usize,
    pub text: String,
    pub error: DecodeError,
}

/// Accepted timestamp layouts, most specific first. `%.f` also matches
/// an absent fractional part.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Decode one persisted line into a task.
///
/// The due date is not checked against the clock; expired tasks load fine
/// and are evicted by the store's sweep.
pub fn decode_task(line: &str) -> Result<Task, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount(fields.len()));
    }

    let id = fields[0]
        .trim()
        .parse::<u64>()
        .ok()
        // u64::MAX would leave the store no id to hand out next
        .filter(|id| *id > 0 && *id < u64::MAX)
        .ok_or_else(|| DecodeError::InvalidId(fields[0].to_string()))?;

    let description = fields[1].trim();
    if description.is_empty() {
        return Err(DecodeError::EmptyDescription);
    }

    let due_at = parse_timestamp(fields[2].trim())
        .ok_or_else(|| DecodeError::InvalidTimestamp(fields[2].to_string()))?;

    let priority = fields[3]
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(Priority::from_number)
        .ok_or_else(|| DecodeError::InvalidPriority(fields[3].to_string()))?;

    let category = Category::from_tag(fields[4].trim())
        .ok_or_else(|| DecodeError::UnknownCategory(fields[4].to_string()))?;

    Ok(Task::restore(
        id,
        description.to_string(),
        due_at,
        priority,
        category,
    ))
}

/// Parse a whole data file. Blank lines are ignored; lines that fail to
/// decode are returned alongside the tasks instead of aborting the parse.
pub fn parse_tasks(content: &str) -> (Vec<Task>, Vec<DroppedLine>) {
    parse_task_bytes(content.as_bytes())
}

/// Parse raw file bytes line by line. A line that is not UTF-8 is dropped
/// on its own and reported with its lossy text.
pub fn parse_task_bytes(content: &[u8]) -> (Vec<Task>, Vec<DroppedLine>) {
    let mut tasks = Vec::new();
    let mut dropped = Vec::new();

    for (idx, raw) in content.split(|b| *b == b'\n').enumerate() {
        let decoded = match std::str::from_utf8(raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => decode_task(line).map_err(|e| (line.to_string(), e)),
            Err(_) => Err((
                String::from_utf8_lossy(raw).into_owned(),
                DecodeError::InvalidUtf8,
            )),
        };
        match decoded {
            Ok(task) => tasks.push(task),
            Err((text, error)) => dropped.push(DroppedLine {
                line_no: idx + 1,
                text: text.trim_end_matches('\r').to_string(),
                error,
            }),
        }
    }

    (tasks, dropped)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
