//! File locking and atomic writes for sb
//!
//! Task files and the `.sb/` state directory can be touched by several
//! sb processes at once (editor plugins, shell, CI). Two primitives keep
//! that safe:
//! - exclusive file locks (fs2/flock) guarding `.sb/` writes
//! - the write-temp-then-rename pattern so a task file is never observed
//!   half-written

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Retry interval while waiting for a held lock
const LOCK_RETRY_INTERVAL_MS: u64 = 50;

/// Whether an flock failure means "somebody else holds it" rather than
/// a real I/O problem. Windows reports lock and sharing violations with
/// raw codes 32/33 instead of `WouldBlock`.
fn lock_is_held(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// Exclusive lock on a file, released when the guard drops
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock, retrying every 50ms until `timeout_ms`
    /// elapses. The lock file and its parent directory are created if
    /// missing. A timeout of zero probes once and gives up.
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file }),
                Err(e) if lock_is_held(&e) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockFailed(path.to_path_buf()));
                    }
                    thread::sleep(Duration::from_millis(LOCK_RETRY_INTERVAL_MS));
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock failures during drop have nowhere to go
        let _ = self.file.unlock();
    }
}

/// Atomically replace the contents of `path`.
///
/// The data goes to a hidden sibling temp file first, then a rename swaps
/// it in, so readers see either the old content or the new one. The temp
/// file must be a sibling of the target: renames only stay atomic within
/// one filesystem.
///
/// Note: no lock is taken. Use [`write_atomic_locked`] for files other sb
/// processes may be rewriting at the same time.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("write");
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()));

    let mut temp = File::create(&temp_path)?;
    temp.write_all(data)?;
    temp.sync_all()?;
    drop(temp);

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Atomically replace the contents of `path` with a string
pub fn write_atomic_str(path: impl AsRef<Path>, data: &str) -> Result<()> {
    write_atomic(path, data.as_bytes())
}

/// Atomic write guarded by a sidecar `<path>.lock` file.
///
/// The lock is held across the temp write and the rename, then released
/// when the guard drops.
pub fn write_atomic_locked(path: impl AsRef<Path>, data: &[u8], timeout_ms: u64) -> Result<()> {
    let path = path.as_ref();

    let mut lock_name = path.as_os_str().to_owned();
    lock_name.push(".lock");
    let _lock = FileLock::acquire(PathBuf::from(lock_name), timeout_ms)?;

    write_atomic(path, data)
}
