//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (unknown report kind, unknown panel).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (malformed filter or date range).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request conflicts with current state (superseded or busy panel).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The hosted data store failed or returned unusable data.
    #[error("Data store error: {0}")]
    DataStore(String),

    /// Rendering or delivering an export failed.
    #[error("Export error: {0}")]
    Export(String),

    /// An upstream collaborator did not answer in time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The request was cancelled before it completed.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// External service error (PDF generator, object storage).
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Cancelled(_) => 499,
            Self::DataStore(_) | Self::ExternalService(_) => 502,
            Self::Timeout(_) => 504,
            Self::Export(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::DataStore(_) => "DATA_STORE_ERROR",
            Self::Export(_) => "EXPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Cancelled(_) => "CANCELLED",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
