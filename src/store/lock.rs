use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::proc::ProcessProbe;

/// How old a lock file must be before its owner is even considered stale.
/// A younger lock is always respected, no matter what its content says.
pub const STALE_AFTER: Duration = Duration::from_millis(2000);

/// Overall caller patience. Staleness retries happen silently inside this
/// window; past it, `acquire` fails rather than hanging forever.
pub const ACQUIRE_CEILING: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct LockOptions {
    pub stale_after: Duration,
    pub ceiling: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            stale_after: STALE_AFTER,
            ceiling: ACQUIRE_CEILING,
        }
    }
}

/// On-disk lock owner metadata. Every field defaults so that partial or
/// legacy content degrades to "unknown owner" instead of a parse error.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockOwner {
    #[serde(default)]
    pid: u32,
    #[serde(default)]
    acquired_at: i64,
    #[serde(default)]
    token: String,
}

enum HolderState {
    /// Fresh, or old but with a live owner. Keep waiting.
    Respected,
    /// Old and its owner is dead (or unknowable). Safe to delete.
    Stale,
    /// Vanished between create attempt and stat. Retry the create.
    Gone,
}

/// Held exclusive lock. Releasing is idempotent and token-checked: if some
/// other process legitimately reclaimed the file after our mtime went stale,
/// dropping this guard leaves their lock alone.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    token: String,
    released: bool,
}

/// Acquire the cross-process lock at `path`, creating the lock file with an
/// atomic create-if-absent. Retries with bounded backoff while another
/// holder's file is present; reclaims it only once it is older than
/// `options.stale_after` AND `probe` reports the recorded owner dead.
pub fn acquire(
    path: &Path,
    probe: &dyn ProcessProbe,
    options: LockOptions,
) -> Result<LockGuard> {
    let start = Instant::now();
    let mut delay = Duration::from_millis(5);
    let max_delay = Duration::from_millis(200);

    loop {
        match try_create(path) {
            Ok(token) => {
                return Ok(LockGuard {
                    path: path.to_path_buf(),
                    token,
                    released: false,
                });
            }
            Err(RegistryError::Io(err)) if err.kind() == ErrorKind::AlreadyExists => {
                match holder_state(path, probe, options.stale_after) {
                    HolderState::Stale => {
                        // A racing reclaimer may have beaten us to the delete.
                        match fs::remove_file(path) {
                            Ok(()) => {}
                            Err(e) if e.kind() == ErrorKind::NotFound => {}
                            Err(e) => return Err(e.into()),
                        }
                        continue;
                    }
                    HolderState::Gone => continue,
                    HolderState::Respected => {
                        if start.elapsed() >= options.ceiling {
                            return Err(RegistryError::LockTimeout(
                                path.display().to_string(),
                            ));
                        }
                        std::thread::sleep(delay);
                        delay = (delay * 2).min(max_delay);
                    }
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Atomically create the lock file and write our owner record.
/// Fails with `AlreadyExists` when another holder's file is present.
fn try_create(path: &Path) -> Result<String> {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let owner = LockOwner {
        pid: std::process::id(),
        acquired_at: Utc::now().timestamp_millis(),
        token: token.clone(),
    };

    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(serde_json::to_string(&owner)?.as_bytes())?;
    Ok(token)
}

fn holder_state(path: &Path, probe: &dyn ProcessProbe, stale_after: Duration) -> HolderState {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => return HolderState::Gone,
    };
    // Staleness is judged against the current attempt, so a holder that
    // keeps its file younger than the window is respected indefinitely.
    let age = meta
        .modified()
        .ok()
        .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
        .unwrap_or_default();
    if age < stale_after {
        return HolderState::Respected;
    }

    // Old enough to question: only a provably-dead (or unknowable) owner is
    // reclaimed. A live long-running holder is never preempted.
    let owner = fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<LockOwner>(&content).ok());
    match owner {
        Some(owner) if probe.is_alive(owner.pid) => HolderState::Respected,
        _ => HolderState::Stale,
    }
}

impl LockGuard {
    /// Delete the lock file if we still own it. Idempotent: an already-absent
    /// file is fine, and a file re-created by another process (different
    /// token) is left untouched.
    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let ours = serde_json::from_str::<LockOwner>(&content)
            .map(|owner| owner.token == self.token)
            .unwrap_or(false);
        if ours {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Best-effort so an early `?` in a critical section never leaks
        // the lock until the staleness window expires.
        let _ = self.release_inner();
    }
}
