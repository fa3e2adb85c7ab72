//! PDF sink contract.
//!
//! Layout is owned by an external generation service; this side only builds
//! the payload it accepts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono_tz::Tz;
use serde::Serialize;

use super::error::ExportError;
use crate::reports::{ColumnSpec, ReportResult, ReportRow};

/// Fixed payload shape accepted by the PDF service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfPayload {
    /// Report title.
    pub title: String,
    /// Column declarations.
    pub columns: Vec<ColumnSpec>,
    /// Rows in display order.
    pub rows: Vec<ReportRow>,
    /// Column totals, when any column is totalled.
    pub totals: Option<BTreeMap<String, String>>,
    /// Period label.
    pub period: String,
    /// Local generation date.
    pub generated_date: String,
}

impl PdfPayload {
    /// Builds the payload for a result. Totals are sent as plain decimal strings.
    #[must_use]
    pub fn from_result(result: &ReportResult, tz: Tz) -> Self {
        Self {
            title: result.title.clone(),
            columns: result.columns.clone(),
            rows: result.rows.clone(),
            totals: result.totals.as_ref().map(|totals| {
                totals
                    .iter()
                    .map(|(key, value)| (key.clone(), value.normalize().to_string()))
                    .collect()
            }),
            period: result.period_label.clone(),
            generated_date: result
                .generated_at
                .with_timezone(&tz)
                .format("%d %b %Y")
                .to_string(),
        }
    }
}

/// Turns a payload into PDF bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Renders the document.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Pdf` if generation fails.
    async fn render(&self, payload: &PdfPayload) -> Result<Bytes, ExportError>;
}
