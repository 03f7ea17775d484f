use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("lock acquisition timed out: {0}")]
    LockTimeout(String),

    #[error("record serializes to {size} bytes, over the {limit} byte atomic-append limit")]
    RecordTooLarge { size: usize, limit: usize },

    #[error("no mapping for {0} message {1}")]
    MappingNotFound(String, String),

    #[error("could not locate a home directory for the registry state dir")]
    NoHomeDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::LockTimeout(_) => "lock_timeout",
            Self::RecordTooLarge { .. } => "record_too_large",
            Self::MappingNotFound(_, _) => "mapping_not_found",
            Self::NoHomeDir => "no_home_dir",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
