use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration as ChronoDuration, Utc};

use crate::error::{RegistryError, Result};
use crate::model::{MappingRecord, Platform};
use crate::proc::{ProcessProbe, SystemProbe};
use crate::store::lock::{self, LockOptions};
use crate::store::paths;

/// Hard ceiling on one serialized record line, newline included. POSIX only
/// guarantees that appends up to the pipe-buffer boundary (4 KiB) land as a
/// single unit, so anything larger could interleave with a concurrent writer
/// and is rejected outright.
pub const MAX_RECORD_BYTES: usize = 4096;

/// Records older than this are compacted away by `prune_stale`.
pub const MAX_RECORD_AGE_HOURS: i64 = 24;

/// The reply-session registry: a JSONL file mapping delivered chat messages
/// to the tmux pane that should receive their reply, shared by independent
/// OS processes (dispatcher, reply listener, hooks, sweeper).
///
/// Mutations serialize through the lock file; reads are deliberately
/// unlocked for availability and tolerate mid-rewrite observations.
pub struct Registry {
    dir: PathBuf,
    probe: Box<dyn ProcessProbe>,
    lock_options: LockOptions,
}

impl Registry {
    /// Open (but do not yet create) a registry under `state_dir`.
    pub fn open(state_dir: &Path) -> Self {
        Self::with_probe(state_dir, Box::new(SystemProbe), LockOptions::default())
    }

    /// Construct with an injected liveness probe and lock timings.
    /// Tests use this to avoid real process tables and multi-second waits.
    pub fn with_probe(
        state_dir: &Path,
        probe: Box<dyn ProcessProbe>,
        lock_options: LockOptions,
    ) -> Self {
        Self {
            dir: state_dir.to_path_buf(),
            probe,
            lock_options,
        }
    }

    pub fn registry_path(&self) -> PathBuf {
        paths::registry_path(&self.dir)
    }

    fn lock_path(&self) -> PathBuf {
        paths::lock_path(&self.dir)
    }

    fn acquire_lock(&self) -> Result<lock::LockGuard> {
        fs::create_dir_all(&self.dir)?;
        lock::acquire(&self.lock_path(), self.probe.as_ref(), self.lock_options)
    }

    /// Open the registry file for appending, creating it owner-read/write
    /// on first use.
    fn open_append(&self) -> Result<fs::File> {
        let mut opts = OpenOptions::new();
        opts.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        Ok(opts.open(self.registry_path())?)
    }

    fn open_truncate(&self) -> Result<fs::File> {
        let mut opts = OpenOptions::new();
        opts.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        Ok(opts.open(self.registry_path())?)
    }

    /// Record a delivered message (lock + single append + unlock).
    ///
    /// The size check runs before the lock is taken so an oversized record
    /// never touches the file.
    pub fn register(&self, record: &MappingRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        if line.len() > MAX_RECORD_BYTES {
            return Err(RegistryError::RecordTooLarge {
                size: line.len(),
                limit: MAX_RECORD_BYTES,
            });
        }

        let guard = self.acquire_lock()?;
        let mut file = self.open_append()?;
        file.write_all(line.as_bytes())?;
        guard.release()
    }

    /// All mappings in file order (oldest first). Unlocked: a missing file
    /// is an empty registry, and lines that fail to parse (partial writes
    /// from an interrupted process, corruption) are skipped, never errors.
    /// Corruption includes non-UTF-8 bytes, so the file is read raw and
    /// decoded per line rather than as one string.
    pub fn load_all(&self) -> Result<Vec<MappingRecord>> {
        let bytes = match fs::read(self.registry_path()) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(err.into()),
        };
        Ok(bytes
            .split(|&b| b == b'\n')
            .filter_map(|line| std::str::from_utf8(line).ok())
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    /// Find the mapping for a platform-assigned message id. Duplicates of
    /// `(platform, message_id)` may coexist; the registry is append-ordered,
    /// so the scan runs newest-first and the most recently written entry
    /// wins.
    pub fn lookup(
        &self,
        platform: Platform,
        message_id: &str,
    ) -> Result<Option<MappingRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .rev()
            .find(|r| r.platform == platform && r.message_id == message_id))
    }

    /// Drop every record for a finished session. Returns how many went.
    pub fn remove_session(&self, session_id: &str) -> Result<usize> {
        self.rewrite(|r| r.session_id != session_id)
    }

    /// Drop every record targeting a (stale) tmux pane.
    pub fn remove_pane(&self, pane_id: &str) -> Result<usize> {
        self.rewrite(|r| r.tmux_pane_id != pane_id)
    }

    /// Compact away records older than [`MAX_RECORD_AGE_HOURS`]. Fail-closed:
    /// a record whose `created_at` does not parse is dropped, not retained.
    pub fn prune_stale(&self) -> Result<usize> {
        let now = Utc::now();
        self.rewrite(|r| is_fresh(r, now))
    }

    /// The single critical section behind all compaction: lock, tolerant
    /// read, order-preserving filter, overwrite, unlock. Overwrites even
    /// when nothing was removed (content unchanged, so harmless).
    fn rewrite<F>(&self, keep: F) -> Result<usize>
    where
        F: Fn(&MappingRecord) -> bool,
    {
        let guard = self.acquire_lock()?;

        let records = self.load_all()?;
        let before = records.len();
        let kept: Vec<&MappingRecord> = records.iter().filter(|r| keep(r)).collect();
        let removed = before - kept.len();

        let mut file = self.open_truncate()?;
        for record in &kept {
            let mut line = serde_json::to_string(record)?;
            line.push('\n');
            file.write_all(line.as_bytes())?;
        }

        guard.release()?;
        Ok(removed)
    }
}

/// Prune predicate, named so the fail-closed timestamp policy is visible
/// and testable rather than buried in a catch-and-ignore.
fn is_fresh(record: &MappingRecord, now: chrono::DateTime<Utc>) -> bool {
    match record.created_at_utc() {
        Some(created) => now - created <= ChronoDuration::hours(MAX_RECORD_AGE_HOURS),
        None => false,
    }
}
