use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tickler::model::{local_now, Category, Priority, Task, TaskError};
use tickler::ops::scheduler::{ReminderKind, ReminderSink, Scheduler, SchedulerConfig};
use tickler::ops::store::TaskStore;
use tickler::parse::{parse_tasks, serialize_tasks};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Could not read fixture {}: {}", name, e))
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(String, ReminderKind)>>);

impl ReminderSink for Recorder {
    fn on_reminder(&self, task: &Task, kind: ReminderKind) {
        self.0
            .lock()
            .unwrap()
            .push((task.description().to_string(), kind));
    }
}

impl Recorder {
    fn wait_for(&self, description: &str, kind: ReminderKind, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self
                .0
                .lock()
                .unwrap()
                .iter()
                .any(|(d, k)| d == description && *k == kind)
            {
                return true;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        false
    }
}

fn quiet_config() -> SchedulerConfig {
    SchedulerConfig {
        sweep_interval: Duration::from_secs(600),
        lookahead: chrono::Duration::minutes(3),
    }
}

#[test]
fn test_fixture_round_trip() {
    let source = fixture("tasks.txt");
    let (tasks, dropped) = parse_tasks(&source);
    assert!(dropped.is_empty());
    assert_eq!(tasks.len(), 4);
    assert_eq!(serialize_tasks(&tasks), source);
}

#[test]
fn test_store_open_keeps_fixture_intact() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tasks.txt");
    fs::write(&path, fixture("tasks.txt")).unwrap();

    let store = TaskStore::open(&path);
    let ids: Vec<u64> = store.list().iter().filter_map(Task::id).collect();
    assert_eq!(ids, vec![1, 2, 5, 9]);
    assert_eq!(store.next_id(), 10);
    assert_eq!(fs::read_to_string(&path).unwrap(), fixture("tasks.txt"));

    let personal: Vec<String> = store
        .list_by_category(Category::Personal)
        .iter()
        .map(|t| t.description().to_string())
        .collect();
    assert_eq!(personal, vec!["Pay rent", "Call the plumber"]);
}

#[test]
fn test_add_delete_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tasks.txt");
    let due = local_now() + chrono::Duration::days(2);

    {
        let store = TaskStore::open(&path);
        let a = store
            .add_task("Draft report", due, Priority::High, Category::Work)
            .unwrap();
        let b = store
            .add_task("Buy milk", due, Priority::Low, Category::Personal)
            .unwrap();
        assert_eq!((a.id(), b.id()), (Some(1), Some(2)));
        assert!(store.delete(1));
        assert!(!store.delete(1));
    }

    let store = TaskStore::open(&path);
    let tasks = store.list();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description(), "Buy milk");
    assert_eq!(tasks[0].priority(), Priority::Low);
    assert_eq!(store.next_id(), 3);
}

#[test]
fn test_multiline_description_never_reaches_the_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tasks.txt");
    let due = local_now() + chrono::Duration::days(1);

    {
        let store = TaskStore::open(&path);
        let err = store
            .add_task("line one\nline two", due, Priority::Medium, Category::Work)
            .unwrap_err();
        assert_eq!(err, TaskError::MultilineDescription);
        store
            .add_task("single line", due, Priority::Medium, Category::Work)
            .unwrap();
    }

    let store = TaskStore::open(&path);
    let descriptions: Vec<String> = store
        .list()
        .iter()
        .map(|t| t.description().to_string())
        .collect();
    assert_eq!(descriptions, vec!["single line"]);
}

#[test]
fn test_urgent_keeps_insertion_order() {
    let tmp = TempDir::new().unwrap();
    let store = TaskStore::open(tmp.path().join("tasks.txt"));
    let now = local_now();
    for (desc, hours) in [("third", 20), ("first", 1), ("outside", 30), ("second", 5)] {
        store
            .add_task(desc, now + chrono::Duration::hours(hours), Priority::Medium, Category::Work)
            .unwrap();
    }

    let urgent: Vec<String> = store
        .list_urgent(now, chrono::Duration::hours(24))
        .iter()
        .map(|t| t.description().to_string())
        .collect();
    assert_eq!(urgent, vec!["third", "first", "second"]);
}

#[test]
fn test_scheduler_fires_due_now() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(TaskStore::open(tmp.path().join("tasks.txt")));
    let sink = Arc::new(Recorder::default());
    let scheduler = Scheduler::start(Arc::clone(&store), sink.clone(), quiet_config());

    store
        .add_task(
            "Stretch",
            local_now() + chrono::Duration::milliseconds(800),
            Priority::Medium,
            Category::Personal,
        )
        .unwrap();

    assert!(sink.wait_for("Stretch", ReminderKind::DueNow, Duration::from_secs(5)));
    scheduler.stop();
}

#[test]
fn test_scheduler_picks_up_reloaded_tasks() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tasks.txt");
    let watched = Arc::new(TaskStore::open(&path));
    let sink = Arc::new(Recorder::default());
    let scheduler = Scheduler::start(Arc::clone(&watched), sink.clone(), quiet_config());

    // A second handle on the same file stands in for another process
    let other = TaskStore::open(&path);
    other
        .add_task(
            "From elsewhere",
            // Persisted timestamps drop sub-second precision
            local_now() + chrono::Duration::seconds(2),
            Priority::High,
            Category::Work,
        )
        .unwrap();

    let added = watched.reload();
    assert_eq!(added.len(), 1);
    assert!(sink.wait_for("From elsewhere", ReminderKind::DueNow, Duration::from_secs(6)));
    scheduler.stop();
}

#[test]
fn test_deleted_task_never_fires() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(TaskStore::open(tmp.path().join("tasks.txt")));
    let sink = Arc::new(Recorder::default());
    let scheduler = Scheduler::start(Arc::clone(&store), sink.clone(), quiet_config());

    let task = store
        .add_task(
            "Cancelled",
            local_now() + chrono::Duration::milliseconds(600),
            Priority::Low,
            Category::Work,
        )
        .unwrap();
    assert!(store.delete(task.id().unwrap()));

    assert!(!sink.wait_for("Cancelled", ReminderKind::DueNow, Duration::from_millis(1500)));
    scheduler.stop();
}
