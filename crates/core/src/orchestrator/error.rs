//! Panel error descriptor.

use serde::Serialize;
use thiserror::Error;

use crate::export::ExportError;
use crate::reports::ReportError;

/// Pipeline stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelStage {
    /// Fetching and aggregating.
    Generate,
    /// Rendering or delivering an artifact.
    Export,
}

/// Error held by a panel after a failed generate or export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// Generation failed.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Export failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl PanelError {
    /// Stage the error came from.
    #[must_use]
    pub const fn stage(&self) -> PanelStage {
        match self {
            Self::Report(_) => PanelStage::Generate,
            Self::Export(_) => PanelStage::Export,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Report(err) => match err {
                ReportError::InvalidRange(_) => "INVALID_RANGE",
                ReportError::InvalidFilter(_) => "INVALID_FILTER",
                ReportError::UnknownKind(_) => "UNKNOWN_REPORT",
                ReportError::Fetch { .. } | ReportError::AllSectionsFailed => "FETCH_FAILED",
                ReportError::Timeout { .. } => "TIMEOUT",
                ReportError::Cancelled => "CANCELLED",
                ReportError::Superseded => "SUPERSEDED",
            },
            Self::Export(err) => match err {
                ExportError::PdfUnavailable => "PDF_UNAVAILABLE",
                ExportError::StorageUnavailable => "STORAGE_UNAVAILABLE",
                ExportError::InvalidState { .. } => "INVALID_STATE",
                _ => "EXPORT_FAILED",
            },
        }
    }

    /// Serialisable view for clients.
    #[must_use]
    pub fn describe(&self) -> PanelErrorView {
        PanelErrorView {
            code: self.code(),
            message: self.to_string(),
            stage: self.stage(),
        }
    }
}

/// `{ code, message, stage }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelErrorView {
    /// Stable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Originating stage.
    pub stage: PanelStage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_codes_and_stages() {
        let fetch = PanelError::from(ReportError::fetch(
            "invoices",
            StoreError::transport("invoices", "connection reset"),
        ));
        assert_eq!(fetch.code(), "FETCH_FAILED");
        assert_eq!(fetch.stage(), PanelStage::Generate);
        assert_eq!(
            fetch.to_string(),
            "Failed to load invoices: request to invoices failed: connection reset"
        );

        let pdf = PanelError::from(ExportError::pdf("502 Bad Gateway"));
        assert_eq!(pdf.code(), "EXPORT_FAILED");
        assert_eq!(pdf.describe().stage, PanelStage::Export);
    }
}
