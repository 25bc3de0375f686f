use std::fs;
use std::path::{Path, PathBuf};

use crate::io::lock::{self, LockError, SnapshotLock};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::task::Task;
use crate::parse::{parse_task_bytes, serialize_tasks};

/// Error type for data file I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Read and decode the data file.
///
/// A missing file is an empty store. Lines that fail to decode are logged,
/// copied to the recovery log, and left out of the result.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, StoreError> {
    let content = match fs::read(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StoreError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let (tasks, dropped) = parse_task_bytes(&content);
    for line in &dropped {
        tracing::warn!(
            file = %path.display(),
            line = line.line_no,
            error = %line.error,
            "skipping malformed task entry"
        );
        recovery::log_recovery(
            path,
            RecoveryEntry::new(RecoveryCategory::Parser, "skipped malformed line")
                .field("Line", line.line_no.to_string())
                .field("Error", line.error.to_string())
                .body(line.text.clone()),
        );
    }
    Ok(tasks)
}

/// Rewrite the data file from a full snapshot.
///
/// On failure the snapshot is appended to the recovery log before the error
/// is returned, so the caller may keep going on its in-memory copy.
pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), StoreError> {
    let content = serialize_tasks(tasks);
    let result = SnapshotLock::acquire(path, lock::DEFAULT_WAIT)
        .map_err(StoreError::from)
        .and_then(|_lock| {
            recovery::atomic_write(path, content.as_bytes()).map_err(|e| StoreError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })
        });

    if let Err(e) = &result {
        recovery::log_recovery(
            path,
            RecoveryEntry::new(RecoveryCategory::Write, "snapshot write failed")
                .field("Target", path.display().to_string())
                .field("Error", e.to_string())
                .body(content),
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::recovery::read_recovery_entries;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let tasks = load_tasks(&tmp.path().join("tasks.txt")).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.txt");
        fs::write(
            &path,
            "1|One|2030-01-01T10:00:00|1|WorkTask\n2|Two|2030-01-02T10:00:00|3|PersonalTask\n",
        )
        .unwrap();

        let tasks = load_tasks(&path).unwrap();
        assert_eq!(tasks.len(), 2);

        save_tasks(&path, &tasks[1..]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2|Two|2030-01-02T10:00:00|3|PersonalTask\n");
    }

    #[test]
    fn test_load_records_dropped_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.txt");
        fs::write(
            &path,
            "1|One|2030-01-01T10:00:00|1|WorkTask\n2|Broken|not-a-date|1|WorkTask\n",
        )
        .unwrap();

        let tasks = load_tasks(&path).unwrap();
        assert_eq!(tasks.len(), 1);

        let entries = read_recovery_entries(&path, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Parser);
        assert_eq!(entries[0].body, "2|Broken|not-a-date|1|WorkTask");
    }

    #[test]
    fn test_load_keeps_lines_around_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.txt");
        fs::write(
            &path,
            b"1|One|2030-01-01T10:00:00|1|WorkTask\n2|Bad \xff|2030-01-01T10:00:00|1|WorkTask\n",
        )
        .unwrap();

        let tasks = load_tasks(&path).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description(), "One");

        let entries = read_recovery_entries(&path, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Parser);
        assert!(entries[0].body.starts_with("2|Bad "));
    }

    #[test]
    fn test_load_unreadable_path_is_error() {
        let tmp = TempDir::new().unwrap();
        // A directory cannot be read as a file
        let result = load_tasks(tmp.path());
        assert!(matches!(result, Err(StoreError::ReadError { .. })));
    }

    #[test]
    fn test_save_failure_goes_to_recovery_log() {
        let tmp = TempDir::new().unwrap();
        // A directory in place of the data file makes the rename fail
        let path = tmp.path().join("tasks.txt");
        fs::create_dir(&path).unwrap();
        let task = crate::parse::decode_task("9|Keep me|2030-01-01T10:00:00|2|WorkTask").unwrap();

        let result = save_tasks(&path, &[task]);
        assert!(matches!(result, Err(StoreError::WriteError { .. })));

        let entries = read_recovery_entries(&path, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert_eq!(entries[0].body, "9|Keep me|2030-01-01T10:00:00|2|WorkTask");
    }
}
