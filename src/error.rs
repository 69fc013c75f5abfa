use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Remote catalog unavailable{}: {message}", status_suffix(.status))]
    RemoteUnavailable { status: Option<u16>, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Coarse error classification handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    RemoteUnavailable,
    NotFound,
    MalformedRecord,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::RemoteUnavailable => "remote_unavailable",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MalformedRecord => "malformed_record",
            ErrorKind::Config => "config",
        }
    }
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CatalogError::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::MalformedRecord(_) | CatalogError::Json(_) => ErrorKind::MalformedRecord,
            CatalogError::Config(_) | CatalogError::Toml(_) | CatalogError::Io(_) => {
                ErrorKind::Config
            }
        }
    }

    /// Per-item failures that a batch absorbs: the record is gone, broken,
    /// or its locator cannot be requested. Anything else is worth retrying.
    pub fn is_droppable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::MalformedRecord | ErrorKind::InvalidArgument
        )
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::RemoteUnavailable {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(err: url::ParseError) -> Self {
        CatalogError::InvalidArgument(format!("invalid URL: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
