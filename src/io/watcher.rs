use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the watch loop.
#[derive(Debug)]
pub enum FileEvent {
    /// The data file was created, rewritten, or removed.
    Changed(PathBuf),
}

/// Watches a single data file for changes made by other processes.
///
/// Snapshot writes replace the file by rename, so the parent directory is
/// watched and events are filtered down to the data file's name.
pub struct DataFileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl DataFileWatcher {
    /// Start watching `data_file`.
    /// Returns a `DataFileWatcher` whose `poll()` method should be called each tick.
    pub fn start(data_file: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let dir = match data_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name: OsString = data_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                if let Some(path) = event
                    .paths
                    .into_iter()
                    .find(|p| p.file_name() == Some(file_name.as_os_str()))
                {
                    let _ = tx.send(FileEvent::Changed(path));
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(DataFileWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending file events.
    /// Returns all queued events (may be empty).
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
