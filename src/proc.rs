/// Process-liveness probing, injectable so lock tests can substitute
/// deterministic fakes instead of depending on the real process table.
pub trait ProcessProbe: Send + Sync {
    /// Whether a process with this pid currently exists on the host.
    /// Must not error: every pid resolves to a definite boolean.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probes the real OS process table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl ProcessProbe for SystemProbe {
    fn is_alive(&self, pid: u32) -> bool {
        // Pid 0 is the sentinel for "no owner recorded"; never treat it
        // as a live process (kill(0, 0) would probe our own process group).
        if pid == 0 {
            return false;
        }

        #[cfg(unix)]
        {
            // No real pid exceeds i32::MAX; a wrapped cast would turn e.g.
            // u32::MAX into kill(-1, 0), which probes every process we can
            // signal and always looks alive. Garbage pids are dead owners.
            let Ok(pid) = i32::try_from(pid) else {
                return false;
            };
            // Signal 0 delivers nothing; it only checks existence.
            // EPERM means the process exists but is not ours: alive.
            let rc = unsafe { libc::kill(pid, 0) };
            if rc == 0 {
                return true;
            }
            std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
        }

        #[cfg(not(unix))]
        {
            // No probe available: assume alive so stale locks are never
            // reclaimed from a holder we cannot verify is gone.
            true
        }
    }
}
