use clap::ValueEnum;

use crate::error::Result;
use crate::model::MappingRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

pub fn print_record(record: &MappingRecord, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(record)?),
        Format::Pretty => {
            println!(
                "[{}] message {} ({})",
                record.platform, record.message_id, record.event
            );
            println!("  session: {}", record.session_id);
            println!(
                "  pane: {} in {}",
                record.tmux_pane_id, record.tmux_session_name
            );
            println!("  created: {}", record.created_at);
            if let Some(ref path) = record.project_path {
                println!("  project: {}", path);
            }
        }
        Format::Minimal => print_minimal_row(record),
    }
    Ok(())
}

pub fn print_records(records: &[MappingRecord], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(records)?),
        Format::Pretty => {
            for record in records {
                print_record(record, Format::Pretty)?;
                println!();
            }
        }
        Format::Minimal => {
            println!(
                "{:11} {:>12} {:12} {:>6} {}",
                "PLATFORM", "MESSAGE", "SESSION", "PANE", "EVENT"
            );
            println!("{}", "-".repeat(60));
            for record in records {
                print_minimal_row(record);
            }
        }
    }
    Ok(())
}

/// Removed-count summary for the compaction commands.
pub fn print_removed(removed: usize, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::json!({ "removed": removed })),
        _ => println!("removed {removed} mapping(s)"),
    }
    Ok(())
}

fn print_minimal_row(record: &MappingRecord) {
    println!(
        "{:11} {:>12} {:12} {:>6} {}",
        record.platform.to_string(),
        truncate(&record.message_id, 12),
        truncate(&record.session_id, 12),
        record.tmux_pane_id,
        record.event
    );
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}
