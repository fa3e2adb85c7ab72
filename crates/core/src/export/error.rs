//! Export error types.

use thiserror::Error;

/// Errors raised while rendering or delivering a report artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// CSV encoding failed.
    #[error("CSV rendering failed: {0}")]
    Csv(String),

    /// JSON encoding failed.
    #[error("JSON rendering failed: {0}")]
    Json(String),

    /// No PDF renderer is configured.
    #[error("PDF export is not configured")]
    PdfUnavailable,

    /// The PDF service failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// No archive storage is configured.
    #[error("archive storage is not configured")]
    StorageUnavailable,

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    StorageConfiguration(String),

    /// Writing to storage failed.
    #[error("storage operation failed: {0}")]
    Storage(String),

    /// Export requested while the panel cannot export.
    #[error("cannot export while the panel is {state}")]
    InvalidState {
        /// Current panel state.
        state: String,
    },
}

impl ExportError {
    /// Create a PDF error.
    #[must_use]
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf(message.into())
    }

    /// Create a storage configuration error.
    #[must_use]
    pub fn storage_configuration(message: impl Into<String>) -> Self {
        Self::StorageConfiguration(message.into())
    }

    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(state: impl ToString) -> Self {
        Self::InvalidState {
            state: state.to_string(),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<opendal::Error> for ExportError {
    fn from(err: opendal::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
