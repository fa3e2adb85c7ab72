//! Export sinks.
//!
//! A [`ReportResult`] is rendered to exactly one artifact: CSV bytes, a
//! printable HTML document, PDF bytes from the external generator, or the
//! serialised result itself.

pub mod csv;
pub mod error;
pub mod html;
pub mod pdf;
pub mod storage;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reports::ReportResult;

pub use error::ExportError;
pub use html::PrintOptions;
pub use pdf::{PdfPayload, PdfRenderer};
pub use storage::{ArchivedArtifact, ExportStorage};

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// Printable HTML document.
    Html,
    /// PDF from the generation service.
    Pdf,
    /// Serialised result.
    Json,
}

impl ExportFormat {
    /// MIME type of the artifact.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv;charset=utf-8",
            Self::Html => "text/html;charset=utf-8",
            Self::Pdf => "application/pdf",
            Self::Json => "application/json",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "html" | "print" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {s}")),
        }
    }
}

/// A rendered report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Suggested file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: &'static str,
    /// Content.
    pub bytes: Bytes,
}

impl Artifact {
    /// Wraps rendered bytes.
    pub fn new(format: ExportFormat, file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: format.content_type(),
            bytes: bytes.into(),
        }
    }
}

/// `<report-type>-report.<ext>`
#[must_use]
pub fn default_file_name(result: &ReportResult, format: ExportFormat) -> String {
    format!("{}-report.{}", result.kind, format.extension())
}

/// Dispatches a result to the sink for a format.
#[derive(Clone)]
pub struct ReportExporter {
    print: PrintOptions,
    pdf: Option<Arc<dyn PdfRenderer>>,
}

impl fmt::Debug for ReportExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportExporter")
            .field("print", &self.print)
            .field("pdf", &self.pdf.is_some())
            .finish()
    }
}

impl ReportExporter {
    /// Exporter without PDF support.
    #[must_use]
    pub const fn new(print: PrintOptions) -> Self {
        Self { print, pdf: None }
    }

    /// Enables PDF export.
    #[must_use]
    pub fn with_pdf_renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.pdf = Some(renderer);
        self
    }

    /// Print settings.
    #[must_use]
    pub const fn print_options(&self) -> &PrintOptions {
        &self.print
    }

    /// True if PDF export is available.
    #[must_use]
    pub const fn supports_pdf(&self) -> bool {
        self.pdf.is_some()
    }

    /// Renders `result` as `format`.
    ///
    /// # Errors
    ///
    /// Returns an `ExportError` if rendering fails or PDF is not configured.
    pub async fn render(
        &self,
        result: &ReportResult,
        format: ExportFormat,
        file_name: Option<&str>,
    ) -> Result<Artifact, ExportError> {
        let file_name = file_name
            .map_or_else(|| default_file_name(result, format), str::to_owned);

        let bytes: Bytes = match format {
            ExportFormat::Csv => csv::render_csv(&result.columns, &result.rows)?.into(),
            ExportFormat::Html => html::render_document(result, &self.print).into_bytes().into(),
            ExportFormat::Json => serde_json::to_vec(result)
                .map_err(|e| ExportError::Json(e.to_string()))?
                .into(),
            ExportFormat::Pdf => {
                let renderer = self.pdf.as_ref().ok_or(ExportError::PdfUnavailable)?;
                renderer
                    .render(&PdfPayload::from_result(result, self.print.tz))
                    .await?
            }
        };

        debug!(report = %result.kind, %format, bytes = bytes.len(), "artifact rendered");
        Ok(Artifact::new(format, file_name, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kabati_shared::types::{Currency, ReportRunId};
    use rust_decimal_macros::dec;

    use crate::period::DateRange;
    use crate::reports::{ColumnSpec, ReportKind, ReportRow};
    use pdf::MockPdfRenderer;

    fn result() -> ReportResult {
        let start = Utc.with_ymd_and_hms(2026, 2, 28, 21, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 31, 21, 0, 0).unwrap();
        ReportResult {
            run_id: ReportRunId::new(),
            kind: ReportKind::Sales,
            title: "Sales Report".into(),
            period: DateRange::new(start, end).unwrap(),
            period_label: "01 Mar 2026 to 31 Mar 2026".into(),
            columns: vec![ColumnSpec::money("amount", "Amount").totalled()],
            rows: vec![ReportRow::new().with("amount", dec!(3500))],
            totals: Some([("amount".to_owned(), dec!(3500))].into_iter().collect()),
            warnings: Vec::new(),
            generated_at: end,
        }
    }

    fn exporter() -> ReportExporter {
        ReportExporter::new(PrintOptions {
            company_name: "Kabati <Workshop>".into(),
            currency: Currency::Kes,
            stylesheet_href: Some("/static/print.css".into()),
            auto_print: true,
            tz: chrono_tz::Africa::Nairobi,
        })
    }

    #[tokio::test]
    async fn test_csv_default_name_and_content_type() {
        let artifact = exporter().render(&result(), ExportFormat::Csv, None).await.unwrap();
        assert_eq!(artifact.file_name, "sales-report.csv");
        assert_eq!(artifact.content_type, "text/csv;charset=utf-8");
        assert_eq!(&artifact.bytes[..], b"\"Amount\"\n\"3500\"\n");
    }

    #[tokio::test]
    async fn test_html_document_shape() {
        let artifact = exporter()
            .render(&result(), ExportFormat::Html, Some("march.html"))
            .await
            .unwrap();
        let html = String::from_utf8(artifact.bytes.to_vec()).unwrap();

        assert_eq!(artifact.file_name, "march.html");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"/static/print.css\">"));
        assert!(html.contains("<h1>Kabati &lt;Workshop&gt;</h1>"));
        assert!(html.contains("Period: 01 Mar 2026 to 31 Mar 2026"));
        assert!(html.contains("KES 3,500.00"));
        assert!(html.contains("window.print()"));
    }

    #[tokio::test]
    async fn test_pdf_requires_renderer() {
        assert_eq!(
            exporter().render(&result(), ExportFormat::Pdf, None).await,
            Err(ExportError::PdfUnavailable)
        );
    }

    #[tokio::test]
    async fn test_pdf_payload_handed_to_renderer() {
        let mut renderer = MockPdfRenderer::new();
        renderer
            .expect_render()
            .withf(|payload| {
                payload.title == "Sales Report"
                    && payload.period == "01 Mar 2026 to 31 Mar 2026"
                    && payload.generated_date == "01 Apr 2026"
                    && payload.totals.as_ref().and_then(|t| t.get("amount")).map(String::as_str)
                        == Some("3500")
            })
            .times(1)
            .returning(|_| Ok(Bytes::from_static(b"%PDF-1.7")));

        let artifact = exporter()
            .with_pdf_renderer(Arc::new(renderer))
            .render(&result(), ExportFormat::Pdf, None)
            .await
            .unwrap();
        assert_eq!(artifact.content_type, "application/pdf");
        assert_eq!(artifact.file_name, "sales-report.pdf");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("print".parse::<ExportFormat>(), Ok(ExportFormat::Html));
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
