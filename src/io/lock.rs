use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a writer waits for another `tk` process before giving up
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

const RETRY_EVERY: Duration = Duration::from_millis(10);

/// Exclusive hold on `<data file>.lock` for the duration of one snapshot
/// write. Released when dropped.
///
/// The lock file itself stays on disk. Every writer flocks the same inode,
/// so two processes can never both believe they own the data file.
#[derive(Debug)]
pub struct SnapshotLock {
    _file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is still locked after {}s; is another tk process writing?", .waited.as_secs())]
    Busy { path: PathBuf, waited: Duration },
}

/// `tasks.txt` is guarded by `tasks.txt.lock` in the same directory
pub fn lock_path(data_file: &Path) -> PathBuf {
    let mut name = data_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    data_file.with_file_name(name)
}

impl SnapshotLock {
    /// Take the lock guarding `data_file`, retrying until `wait` runs out.
    pub fn acquire(data_file: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = lock_path(data_file);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + wait;
        while !try_flock(&file) {
            if Instant::now() >= deadline {
                return Err(LockError::Busy { path, waited: wait });
            }
            std::thread::sleep(RETRY_EVERY);
        }
        Ok(SnapshotLock { _file: file })
    }
}

#[cfg(unix)]
fn try_flock(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    // Closing the descriptor on drop releases the flock
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> bool {
    true
}
