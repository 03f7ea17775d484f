use std::path::Path;

use crate::error::{RegistryError, Result};
use crate::model::{MappingRecord, Platform, now_timestamp};
use crate::output::{self, Format};
use crate::store::registry::Registry;

#[allow(clippy::too_many_arguments)]
pub fn register(
    state_dir: &Path,
    platform: Platform,
    message_id: String,
    session_id: String,
    pane: String,
    session_name: String,
    event: String,
    project_path: Option<String>,
    created_at: Option<String>,
    format: Format,
) -> Result<()> {
    let record = MappingRecord {
        platform,
        message_id,
        session_id,
        tmux_pane_id: pane,
        tmux_session_name: session_name,
        event,
        created_at: created_at.unwrap_or_else(now_timestamp),
        project_path,
    };
    Registry::open(state_dir).register(&record)?;
    output::print_record(&record, format)
}

pub fn lookup(
    state_dir: &Path,
    platform: Platform,
    message_id: &str,
    format: Format,
) -> Result<()> {
    let registry = Registry::open(state_dir);
    match registry.lookup(platform, message_id)? {
        Some(record) => output::print_record(&record, format),
        None => Err(RegistryError::MappingNotFound(
            platform.to_string(),
            message_id.to_string(),
        )),
    }
}

pub fn list(state_dir: &Path, format: Format) -> Result<()> {
    let records = Registry::open(state_dir).load_all()?;
    output::print_records(&records, format)
}

pub fn remove_session(state_dir: &Path, session_id: &str, format: Format) -> Result<()> {
    let removed = Registry::open(state_dir).remove_session(session_id)?;
    output::print_removed(removed, format)
}

pub fn remove_pane(state_dir: &Path, pane_id: &str, format: Format) -> Result<()> {
    let removed = Registry::open(state_dir).remove_pane(pane_id)?;
    output::print_removed(removed, format)
}

pub fn prune(state_dir: &Path, format: Format) -> Result<()> {
    let removed = Registry::open(state_dir).prune_stale()?;
    output::print_removed(removed, format)
}
