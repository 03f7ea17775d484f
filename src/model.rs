use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Chat platform a notification was delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum Platform {
    DiscordBot,
    Telegram,
}

/// One delivered message correlated with the tmux pane that should receive
/// its reply. Field names are camelCase on disk to match the existing
/// registry file format.
///
/// `created_at` is kept as the raw ISO-8601 string rather than a parsed
/// timestamp: the store must load records whose timestamp is garbage (prune
/// drops them; nothing else cares), so parsing is deferred to
/// [`MappingRecord::created_at_utc`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MappingRecord {
    pub platform: Platform,
    pub message_id: String,
    pub session_id: String,
    pub tmux_pane_id: String,
    pub tmux_session_name: String,
    pub event: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiscordBot => write!(f, "discord-bot"),
            Self::Telegram => write!(f, "telegram"),
        }
    }
}

impl MappingRecord {
    /// Parse `created_at`, or `None` if the stored value is not a timestamp.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Current time in the registry's on-disk timestamp format
/// (RFC 3339 with millisecond precision, Zulu).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
