//! Registry, storage and fetch errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RadarError {
    #[error("invalid namespace '{0}': use 1-32 letters, digits, '_' or '-'")]
    InvalidNamespace(String),

    #[error("a list named '{0}' already exists")]
    NamespaceTaken(String),

    #[error("no list named '{0}'")]
    UnknownNamespace(String),

    #[error("list '{0}' is public and cannot be modified")]
    NotPrivate(String),

    #[error("player {0} is already on a list")]
    AlreadyListed(uuid::Uuid),

    #[error("player {0} is not on list '{1}'")]
    NotListed(uuid::Uuid, String),

    #[error("unsupported list format version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid entry for {uuid}: {reason}")]
    InvalidEntry { uuid: uuid::Uuid, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },
}

pub type Result<T> = std::result::Result<T, RadarError>;
