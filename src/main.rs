use std::path::PathBuf;

use clap::{Parser, Subcommand};
use omc_registry::model::Platform;
use omc_registry::output::Format;
use omc_registry::store::paths;

#[derive(Parser)]
#[command(
    name = "omc-registry",
    version,
    about = "Reply-session registry mapping chat-platform messages to tmux panes"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Override the state directory (default: $OMC_STATE_DIR or ~/.omc/state)
    #[arg(long, global = true, hide = true)]
    state_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a delivered message and the pane that should receive its reply
    Register {
        /// Chat platform the message was sent to
        #[arg(long, value_enum)]
        platform: Platform,
        /// Platform-assigned message identifier
        #[arg(long)]
        message_id: String,
        /// Logical session identifier
        #[arg(long)]
        session_id: String,
        /// Target tmux pane id (e.g. %0)
        #[arg(long)]
        pane: String,
        /// Target tmux session name
        #[arg(long)]
        session_name: String,
        /// Event tag (e.g. session-start, ask-user-question)
        #[arg(long)]
        event: String,
        /// Project path associated with the session
        #[arg(long)]
        project_path: Option<String>,
        /// Override the created-at timestamp (RFC 3339; defaults to now)
        #[arg(long, hide = true)]
        created_at: Option<String>,
    },
    /// Find the pane mapping for a message (most recent duplicate wins)
    Lookup {
        /// Chat platform
        #[arg(value_enum)]
        platform: Platform,
        /// Platform-assigned message identifier
        message_id: String,
    },
    /// List all mappings in file order
    List,
    /// Remove every mapping for an ended session
    RemoveSession {
        /// Session identifier to remove
        session_id: String,
    },
    /// Remove every mapping targeting a stale pane
    RemovePane {
        /// tmux pane id to remove
        pane_id: String,
    },
    /// Compact away mappings older than 24 hours or with unreadable timestamps
    Prune,
}

fn run(cli: Cli, format: Format) -> omc_registry::error::Result<()> {
    let state_dir = paths::resolve_state_dir(cli.state_dir.as_deref())?;

    match cli.command {
        Commands::Register {
            platform,
            message_id,
            session_id,
            pane,
            session_name,
            event,
            project_path,
            created_at,
        } => omc_registry::commands::register(
            &state_dir,
            platform,
            message_id,
            session_id,
            pane,
            session_name,
            event,
            project_path,
            created_at,
            format,
        ),
        Commands::Lookup {
            platform,
            message_id,
        } => omc_registry::commands::lookup(&state_dir, platform, &message_id, format),
        Commands::List => omc_registry::commands::list(&state_dir, format),
        Commands::RemoveSession { session_id } => {
            omc_registry::commands::remove_session(&state_dir, &session_id, format)
        }
        Commands::RemovePane { pane_id } => {
            omc_registry::commands::remove_pane(&state_dir, &pane_id, format)
        }
        Commands::Prune => omc_registry::commands::prune(&state_dir, format),
    }
}

fn main() {
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
