use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, NaiveDateTime};

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::store_io;
use crate::model::task::{local_now, Category, Priority, Task, TaskError};
use crate::ops::scheduler::TimerHandle;
use crate::parse::encode_task;

/// The task collection plus the id counter, guarded together.
#[derive(Debug, Default)]
struct StoreInner {
    tasks: Vec<Task>,
    next_id: u64,
}

impl StoreInner {
    fn from_loaded(tasks: Vec<Task>) -> Self {
        let mut inner = StoreInner {
            tasks: Vec::with_capacity(tasks.len()),
            next_id: 1,
        };
        for task in tasks {
            let id = task.id().unwrap_or(0);
            // First occurrence of an id wins
            if inner.tasks.iter().any(|t| t.id() == Some(id)) {
                tracing::warn!(id, "dropping duplicate task id from data file");
                continue;
            }
            inner.next_id = inner.next_id.max(id.saturating_add(1));
            inner.tasks.push(task);
        }
        inner
    }
}

/// Owns the task collection and its data file.
///
/// Every mutation rewrites the full snapshot while the collection lock is
/// held, so a snapshot never reflects a half-applied change. Persistence
/// failures are logged and never roll back the in-memory state.
pub struct TaskStore {
    path: PathBuf,
    inner: Mutex<StoreInner>,
    timers: Mutex<Option<TimerHandle>>,
}

impl TaskStore {
    /// Load the data file at `path`, then evict expired tasks and write the
    /// cleaned snapshot back.
    ///
    /// An unreadable file is logged and yields an empty store. The file is
    /// left untouched in that case until the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tasks, loaded) = match store_io::load_tasks(&path) {
            Ok(tasks) => (tasks, true),
            Err(e) => {
                tracing::error!(error = %e, "could not load tasks; starting empty");
                (Vec::new(), false)
            }
        };
        tracing::debug!(file = %path.display(), count = tasks.len(), "loaded tasks");

        let store = TaskStore {
            path,
            inner: Mutex::new(StoreInner::from_loaded(tasks)),
            timers: Mutex::new(None),
        };

        let now = local_now();
        let mut inner = store.lock();
        let removed = evict_expired(&mut inner.tasks, now);
        if removed > 0 {
            tracing::info!(removed, "evicted expired tasks on startup");
        }
        if loaded {
            store.persist(&inner.tasks);
        }
        drop(inner);
        store
    }

    /// Path of the backing data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The id the next added task will receive
    pub fn next_id(&self) -> u64 {
        self.lock().next_id
    }

    /// Insert a task, assigning the next id if it has none. Persists the
    /// snapshot and schedules the task's due-now reminder.
    pub fn add(&self, task: Task) -> u64 {
        let mut inner = self.lock();
        let task = match task.id() {
            Some(id) if !inner.tasks.iter().any(|t| t.id() == Some(id)) => {
                inner.next_id = inner.next_id.max(id.saturating_add(1));
                task
            }
            _ => {
                let id = inner.next_id;
                inner.next_id = id.saturating_add(1);
                task.with_id(id)
            }
        };
        let id = task.id().unwrap_or(0);
        inner.tasks.push(task.clone());
        self.persist(&inner.tasks);
        drop(inner);

        tracing::info!(id, due = %task.due_at(), "task added");
        if let Some(timers) = self.timer_handle() {
            timers.schedule(&task, local_now());
        }
        id
    }

    /// Validate and add a new task. Nothing changes if validation fails.
    pub fn add_task(
        &self,
        description: &str,
        due_at: NaiveDateTime,
        priority: Priority,
        category: Category,
    ) -> Result<Task, TaskError> {
        let task = Task::new(description, due_at, priority, category)?;
        let id = self.add(task.clone());
        Ok(task.with_id(id))
    }

    /// Remove the task with `id`. Returns whether a task was removed.
    pub fn delete(&self, id: u64) -> bool {
        let mut inner = self.lock();
        let Some(pos) = inner.tasks.iter().position(|t| t.id() == Some(id)) else {
            return false;
        };
        let task = inner.tasks.remove(pos);
        self.persist(&inner.tasks);
        drop(inner);

        recovery::log_recovery(
            &self.path,
            RecoveryEntry::new(RecoveryCategory::Delete, format!("task {} deleted", id))
                .body(encode_task(&task)),
        );
        if let Some(timers) = self.timer_handle() {
            timers.cancel(id);
        }
        tracing::info!(id, "task deleted");
        true
    }

    /// Look up a task by id without sweeping.
    pub fn get(&self, id: u64) -> Option<Task> {
        self.lock().tasks.iter().find(|t| t.id() == Some(id)).cloned()
    }

    /// Every task in insertion order, after evicting expired ones.
    pub fn list(&self) -> Vec<Task> {
        self.list_at(local_now())
    }

    pub fn list_at(&self, now: NaiveDateTime) -> Vec<Task> {
        self.sweep_locked(now).tasks.clone()
    }

    /// Live tasks of one category, insertion order.
    pub fn list_by_category(&self, category: Category) -> Vec<Task> {
        let now = local_now();
        let inner = self.sweep_locked(now);
        inner
            .tasks
            .iter()
            .filter(|t| t.category() == category && !t.is_expired(now))
            .cloned()
            .collect()
    }

    /// Live tasks due before `now + horizon`, insertion order.
    pub fn list_urgent(&self, now: NaiveDateTime, horizon: Duration) -> Vec<Task> {
        let cutoff = now + horizon;
        let inner = self.sweep_locked(now);
        inner
            .tasks
            .iter()
            .filter(|t| t.due_at() < cutoff && !t.is_expired(now))
            .cloned()
            .collect()
    }

    /// Evict every expired task. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(local_now())
    }

    pub fn sweep_expired_at(&self, now: NaiveDateTime) -> usize {
        let inner = self.lock();
        let before = inner.tasks.len();
        let inner = self.sweep_guard(inner, now);
        before - inner.tasks.len()
    }

    /// Re-read the data file after another process changed it.
    ///
    /// Returns the tasks that were not in memory before; their reminders are
    /// scheduled, and reminders of tasks that disappeared are cancelled.
    pub fn reload(&self) -> Vec<Task> {
        // Held across the read so no add or delete lands between the read
        // and the swap
        let mut inner = self.lock();
        let loaded = match store_io::load_tasks(&self.path) {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "could not reload tasks; keeping current state");
                return Vec::new();
            }
        };

        let old_ids: HashSet<u64> = inner.tasks.iter().filter_map(Task::id).collect();
        let fresh = StoreInner::from_loaded(loaded);
        let new_ids: HashSet<u64> = fresh.tasks.iter().filter_map(Task::id).collect();

        let added: Vec<Task> = fresh
            .tasks
            .iter()
            .filter(|t| t.id().is_some_and(|id| !old_ids.contains(&id)))
            .cloned()
            .collect();
        let removed: Vec<u64> = old_ids.difference(&new_ids).copied().collect();

        // Never hand out an id this process already used
        let next_id = inner.next_id.max(fresh.next_id);
        *inner = StoreInner {
            tasks: fresh.tasks,
            next_id,
        };
        drop(inner);

        if !added.is_empty() || !removed.is_empty() {
            tracing::info!(added = added.len(), removed = removed.len(), "reloaded tasks");
        }
        if let Some(timers) = self.timer_handle() {
            let now = local_now();
            for task in &added {
                timers.schedule(task, now);
            }
            for id in removed {
                timers.cancel(id);
            }
        }
        added
    }

    /// Connect the scheduler's timer queue. Every current task gets its
    /// due-now reminder scheduled.
    pub(crate) fn attach_timers(&self, timers: TimerHandle) {
        // Under the collection lock: a concurrent add either lands in this
        // snapshot or sees the installed handle
        let inner = self.lock();
        let now = local_now();
        for task in &inner.tasks {
            timers.schedule(task, now);
        }
        *self.timers.lock().unwrap_or_else(PoisonError::into_inner) = Some(timers);
    }

    pub(crate) fn detach_timers(&self) {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn timer_handle(&self) -> Option<TimerHandle> {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep_locked(&self, now: NaiveDateTime) -> MutexGuard<'_, StoreInner> {
        let inner = self.lock();
        self.sweep_guard(inner, now)
    }

    fn sweep_guard<'a>(
        &self,
        mut inner: MutexGuard<'a, StoreInner>,
        now: NaiveDateTime,
    ) -> MutexGuard<'a, StoreInner> {
        let removed = evict_expired(&mut inner.tasks, now);
        if removed > 0 {
            tracing::debug!(removed, "evicted expired tasks");
            self.persist(&inner.tasks);
        }
        inner
    }

    fn persist(&self, tasks: &[Task]) {
        if let Err(e) = store_io::save_tasks(&self.path, tasks) {
            tracing::error!(error = %e, "could not save tasks; keeping them in memory");
        }
    }
}

fn evict_expired(tasks: &mut Vec<Task>, now: NaiveDateTime) -> usize {
    let before = tasks.len();
    tasks.retain(|t| !t.is_expired(now));
    before - tasks.len()
}
