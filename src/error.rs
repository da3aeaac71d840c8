use serde::Serialize;
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid domain: '{domain}'")]
    InvalidDomain { domain: String },

    #[error("Unknown category: '{tag}'")]
    UnknownCategory { tag: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Cannot delete: {reason}")]
    DeleteFailed { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage rejected write: {0}")]
    Storage(String),

    #[error("Remote categorization unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Coarse error taxonomy reported to the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    StorageFailure,
    RemoteUnavailable,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDomain { .. }
            | Self::UnknownCategory { .. }
            | Self::InvalidInput { .. }
            | Self::DeleteFailed { .. }
            | Self::Json(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Database(_) | Self::Storage(_) | Self::LockPoisoned => ErrorKind::StorageFailure,
            Self::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
        }
    }
}

impl From<AppError> for String {
    fn from(e: AppError) -> Self {
        e.to_string()
    }
}
