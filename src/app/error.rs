use thiserror::Error;

use crate::transport::template::TemplateError;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The server answered but signaled failure.
    #[error("{message}")]
    Remote {
        message: String,
        raw: Option<String>,
    },

    /// The server re-rendered the edit form instead of saving the page.
    #[error("Edit conflict on {page}; fetch the page again and merge your changes")]
    EditConflict { page: String },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Wiki not found: {0}")]
    WikiNotFound(String),

    #[error("Page not found: {page} on {wiki}")]
    PageNotFound { wiki: String, page: String },

    #[error("Command template error: {0}")]
    Template(#[from] TemplateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl SyncError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            raw: None,
        }
    }

    /// Whether retrying the same transition (possibly with other inputs) can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::EditConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
