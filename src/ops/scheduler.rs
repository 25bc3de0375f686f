use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::model::config::ReminderConfig;
use crate::model::task::{local_now, Category, Task};
use crate::ops::store::TaskStore;
use crate::parse::DISPLAY_FORMAT;

/// What a reminder is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    /// The task falls inside the lookahead window
    DueSoon,
    /// The task's due time has arrived
    DueNow,
}

/// Receives reminders. Implemented by whatever presents them to the user.
pub trait ReminderSink: Send + Sync {
    fn on_reminder(&self, task: &Task, kind: ReminderKind);
}

/// Render the reminder text for a task.
pub fn reminder_message(task: &Task, kind: ReminderKind) -> String {
    let label = match task.category() {
        Category::Work => "Work task",
        Category::Personal => "Personal task",
    };
    match kind {
        ReminderKind::DueSoon => format!(
            "{} reminder: \"{}\" is due at {}",
            label,
            task.description(),
            task.due_at().format(DISPLAY_FORMAT)
        ),
        ReminderKind::DueNow => format!("{} \"{}\" is due now!", label, task.description()),
    }
}

// ---------------------------------------------------------------------------
// Due-soon sweep
// ---------------------------------------------------------------------------

/// One pass of the periodic check: evict expired tasks, then emit `DueSoon`
/// for tasks inside the lookahead window. Each task is announced once per
/// `DueSoonSweep` instance.
#[derive(Debug)]
pub struct DueSoonSweep {
    lookahead: chrono::Duration,
    notified: HashSet<u64>,
}

impl DueSoonSweep {
    pub fn new(lookahead: chrono::Duration) -> Self {
        DueSoonSweep {
            lookahead,
            notified: HashSet::new(),
        }
    }

    /// Run one pass at `now`. Returns the number of reminders emitted.
    pub fn run(&mut self, store: &TaskStore, sink: &dyn ReminderSink, now: NaiveDateTime) -> usize {
        let evicted = store.sweep_expired_at(now);
        if evicted > 0 {
            tracing::debug!(evicted, "sweep evicted expired tasks");
        }

        let upcoming = store.list_urgent(now, self.lookahead);
        let live: HashSet<u64> = upcoming.iter().filter_map(Task::id).collect();

        let mut emitted = 0;
        for task in &upcoming {
            let Some(id) = task.id() else { continue };
            if self.notified.insert(id) {
                sink.on_reminder(task, ReminderKind::DueSoon);
                emitted += 1;
            }
        }

        // Ids are never reused, so only ids still in the window matter
        self.notified.retain(|id| live.contains(id));
        emitted
    }
}

// ---------------------------------------------------------------------------
// One-shot timers
// ---------------------------------------------------------------------------

pub(crate) enum TimerCommand {
    Schedule(Task),
    Cancel(u64),
    Stop,
}

/// Handle for queueing due-now reminders on the scheduler's timer thread.
#[derive(Clone)]
pub struct TimerHandle {
    tx: Sender<TimerCommand>,
}

impl TimerHandle {
    /// Queue a due-now reminder. Tasks already due at `now` are skipped.
    /// Returns whether the reminder was queued.
    pub fn schedule(&self, task: &Task, now: NaiveDateTime) -> bool {
        if task.id().is_none() || task.due_at() <= now {
            return false;
        }
        self.tx.send(TimerCommand::Schedule(task.clone())).is_ok()
    }

    /// Drop the pending reminder for `id`, if any.
    pub fn cancel(&self, id: u64) {
        let _ = self.tx.send(TimerCommand::Cancel(id));
    }
}

#[cfg(test)]
impl TimerHandle {
    /// A handle with no timer thread behind it. Commands collect on the
    /// returned receiver.
    pub(crate) fn detached() -> (Self, Receiver<TimerCommand>) {
        let (tx, rx) = mpsc::channel();
        (TimerHandle { tx }, rx)
    }
}

/// Ids of every task queued on `rx` so far
#[cfg(test)]
pub(crate) fn scheduled_ids(rx: &Receiver<TimerCommand>) -> Vec<u64> {
    rx.try_iter()
        .filter_map(|cmd| match cmd {
            TimerCommand::Schedule(task) => task.id(),
            _ => None,
        })
        .collect()
}

/// Pending due-now reminders ordered by due time
#[derive(Default)]
struct TimerQueue {
    heap: BinaryHeap<Reverse<(NaiveDateTime, u64)>>,
    pending: HashMap<u64, Task>,
}

impl TimerQueue {
    fn push(&mut self, task: Task) {
        let Some(id) = task.id() else { return };
        self.heap.push(Reverse((task.due_at(), id)));
        self.pending.insert(id, task);
    }

    fn cancel(&mut self, id: u64) {
        self.pending.remove(&id);
    }

    /// Pop every reminder due at or before `now`, skipping cancelled ones
    fn pop_due(&mut self, now: NaiveDateTime) -> Vec<Task> {
        let mut due = Vec::new();
        while let Some(Reverse((at, id))) = self.heap.peek().copied() {
            if at > now {
                break;
            }
            self.heap.pop();
            // A rescheduled id has a later heap entry with the current due time
            if self.pending.get(&id).is_some_and(|t| t.due_at() == at)
                && let Some(task) = self.pending.remove(&id)
            {
                due.push(task);
            }
        }
        due
    }

    /// Time until the next live reminder, `None` if nothing is pending
    fn next_wait(&mut self, now: NaiveDateTime) -> Option<Duration> {
        while let Some(Reverse((at, id))) = self.heap.peek().copied() {
            if self.pending.get(&id).is_some_and(|t| t.due_at() == at) {
                return Some((at - now).to_std().unwrap_or(Duration::ZERO));
            }
            self.heap.pop();
        }
        None
    }
}

fn run_timer_loop(sink: Arc<dyn ReminderSink>, rx: Receiver<TimerCommand>) {
    let mut queue = TimerQueue::default();
    loop {
        let now = local_now();
        for task in queue.pop_due(now) {
            sink.on_reminder(&task, ReminderKind::DueNow);
        }

        let received = match queue.next_wait(now) {
            Some(wait) => rx.recv_timeout(wait),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(TimerCommand::Schedule(task)) => queue.push(task),
            Ok(TimerCommand::Cancel(id)) => queue.cancel(id),
            Ok(TimerCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
    tracing::debug!(pending = queue.pending.len(), "reminder timers stopped");
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Settings for a running scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pause between due-soon sweeps
    pub sweep_interval: Duration,
    /// How far ahead a sweep looks for due-soon tasks
    pub lookahead: chrono::Duration,
}

impl SchedulerConfig {
    /// Settings for the long-running watch loop
    pub fn watch(reminders: &ReminderConfig) -> Self {
        SchedulerConfig {
            sweep_interval: reminders.sweep_interval(),
            lookahead: reminders.due_soon_window(),
        }
    }
}

/// Background reminder service: a periodic due-soon sweep plus a timer
/// thread that fires each task's due-now reminder.
///
/// Stops on `stop()` or when dropped.
pub struct Scheduler {
    store: Arc<TaskStore>,
    stop_tx: Option<Sender<()>>,
    timer_tx: Sender<TimerCommand>,
    sweep_thread: Option<JoinHandle<()>>,
    timer_thread: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Start both background threads and hook the timer queue into `store`,
    /// which schedules due-now reminders for every task it already holds.
    pub fn start(
        store: Arc<TaskStore>,
        sink: Arc<dyn ReminderSink>,
        config: SchedulerConfig,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::channel();
        let timer_sink = Arc::clone(&sink);
        let timer_thread = thread::spawn(move || run_timer_loop(timer_sink, timer_rx));
        store.attach_timers(TimerHandle {
            tx: timer_tx.clone(),
        });

        let (stop_tx, stop_rx) = mpsc::channel();
        let sweep_store = Arc::clone(&store);
        let sweep_thread = thread::spawn(move || {
            let mut sweep = DueSoonSweep::new(config.lookahead);
            loop {
                sweep.run(&sweep_store, sink.as_ref(), local_now());
                match stop_rx.recv_timeout(config.sweep_interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            tracing::info!("reminder sweep stopped");
        });

        tracing::info!(
            interval_secs = config.sweep_interval.as_secs(),
            lookahead_minutes = config.lookahead.num_minutes(),
            "reminder scheduler started"
        );

        Scheduler {
            store,
            stop_tx: Some(stop_tx),
            timer_tx,
            sweep_thread: Some(sweep_thread),
            timer_thread: Some(timer_thread),
        }
    }

    /// Signal both threads to finish and wait for them.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(stop_tx) = self.stop_tx.take() else {
            return;
        };
        self.store.detach_timers();
        let _ = stop_tx.send(());
        let _ = self.timer_tx.send(TimerCommand::Stop);

        for handle in [self.sweep_thread.take(), self.timer_thread.take()]
            .into_iter()
            .flatten()
        {
            if handle.join().is_err() {
                tracing::error!("reminder thread panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
