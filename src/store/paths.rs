use std::path::{Path, PathBuf};

use crate::error::{RegistryError, Result};

pub const REGISTRY_FILE: &str = "reply-session-registry.jsonl";
pub const LOCK_FILE: &str = "reply-session-registry.lock";

/// Resolve the state directory holding the registry and its lock file.
///
/// Precedence: explicit flag, then `$OMC_STATE_DIR`, then `~/.omc/state`.
pub fn resolve_state_dir(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os("OMC_STATE_DIR").filter(|s| !s.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".omc").join("state"))
        .ok_or(RegistryError::NoHomeDir)
}

pub fn registry_path(state_dir: &Path) -> PathBuf {
    state_dir.join(REGISTRY_FILE)
}

pub fn lock_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOCK_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-var tests must not run concurrently.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn flag_wins_over_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { std::env::set_var("OMC_STATE_DIR", "/tmp/from-env") };

        let dir = resolve_state_dir(Some(Path::new("/tmp/from-flag"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/from-flag"));

        unsafe { std::env::remove_var("OMC_STATE_DIR") };
    }

    #[test]
    fn env_wins_over_home() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { std::env::set_var("OMC_STATE_DIR", "/tmp/from-env") };

        let dir = resolve_state_dir(None).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/from-env"));

        unsafe { std::env::remove_var("OMC_STATE_DIR") };
    }

    #[test]
    fn defaults_under_home() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { std::env::remove_var("OMC_STATE_DIR") };

        let dir = resolve_state_dir(None).unwrap();
        assert!(dir.ends_with(".omc/state"));
    }

    #[test]
    fn file_names_are_stable() {
        let dir = Path::new("/s");
        assert_eq!(
            registry_path(dir),
            PathBuf::from("/s/reply-session-registry.jsonl")
        );
        assert_eq!(
            lock_path(dir),
            PathBuf::from("/s/reply-session-registry.lock")
        );
    }
}
