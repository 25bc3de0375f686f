use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::cli::commands::WatchArgs;
use crate::cli::sink::ConsoleSink;
use crate::io::watcher::DataFileWatcher;
use crate::ops::scheduler::{Scheduler, SchedulerConfig};
use crate::ops::store::TaskStore;

use super::{CmdResult, Context};

const TICK: Duration = Duration::from_millis(250);

/// Run the reminder scheduler until `q`, end of input, or `--duration` elapses.
/// Edits made to the data file by other `tk` invocations are picked up live.
pub(crate) fn cmd_watch(ctx: &Context, args: WatchArgs) -> CmdResult {
    let store = Arc::new(TaskStore::open(&ctx.data_file));
    let sink = Arc::new(ConsoleSink::new(ctx.json));
    let config = SchedulerConfig::watch(&ctx.config.reminders);
    let scheduler = Scheduler::start(Arc::clone(&store), sink, config);

    let watcher = match DataFileWatcher::start(&ctx.data_file) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "file watching unavailable, external edits will be missed");
            None
        }
    };

    let deadline = args.duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    let (quit_tx, quit_rx) = mpsc::channel::<()>();
    if deadline.is_none() {
        if !ctx.json {
            println!(
                "Watching {} ({} tasks). Type q to quit.",
                ctx.data_file.display(),
                store.list().len()
            );
        }
        thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(l) if l.trim().eq_ignore_ascii_case("q") => break,
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }
            let _ = quit_tx.send(());
        });
    }

    loop {
        match quit_rx.recv_timeout(TICK) {
            Ok(()) => break,
            Err(RecvTimeoutError::Timeout) => {}
            // No stdin reader when running for a fixed duration
            Err(RecvTimeoutError::Disconnected) => thread::sleep(TICK),
        }
        if let Some(ref w) = watcher
            && !w.poll().is_empty()
        {
            let added = store.reload();
            tracing::debug!(added = added.len(), "reloaded after external change");
        }
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            break;
        }
    }

    scheduler.stop();
    Ok(())
}
