//! Error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kabati_core::export::ExportError;
use kabati_core::orchestrator::PanelError;
use kabati_core::period::PeriodError;
use kabati_core::reports::ReportError;
use kabati_shared::AppError;
use serde_json::json;
use tracing::error;

/// An `AppError` rendered as `{"error": code, "message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<PeriodError> for ApiError {
    fn from(err: PeriodError) -> Self {
        Self(AppError::Validation(err.to_string()))
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        let message = err.to_string();
        Self(match err {
            ReportError::InvalidRange(_) | ReportError::InvalidFilter(_) => {
                AppError::Validation(message)
            }
            ReportError::UnknownKind(_) => AppError::NotFound(message),
            ReportError::Fetch { .. } | ReportError::AllSectionsFailed => {
                AppError::DataStore(message)
            }
            ReportError::Timeout { .. } => AppError::Timeout(message),
            ReportError::Cancelled => AppError::Cancelled(message),
            ReportError::Superseded => AppError::Conflict(message),
        })
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        let message = err.to_string();
        Self(match err {
            ExportError::PdfUnavailable | ExportError::StorageUnavailable => {
                AppError::Validation(message)
            }
            ExportError::InvalidState { .. } => AppError::Conflict(message),
            ExportError::Pdf(_) | ExportError::Storage(_) => AppError::ExternalService(message),
            ExportError::Csv(_) | ExportError::Json(_) | ExportError::StorageConfiguration(_) => {
                AppError::Export(message)
            }
        })
    }
}

impl From<PanelError> for ApiError {
    fn from(err: PanelError) -> Self {
        match err {
            PanelError::Report(err) => err.into(),
            PanelError::Export(err) => err.into(),
        }
    }
}
