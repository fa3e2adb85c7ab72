//! CSV sink.
//!
//! Every field is double-quoted with inner quotes doubled; the header row
//! carries column labels; lines end with `\n`; nulls are empty fields.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::error::ExportError;
use crate::reports::{ColumnSpec, ReportRow};

/// Renders rows as CSV bytes. Empty input yields the header line only.
///
/// # Errors
///
/// Returns `ExportError::Csv` if the writer fails.
pub fn render_csv(columns: &[ColumnSpec], rows: &[ReportRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.label.as_str()))?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| row.get(&c.key).plain()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.error().to_string()))
}
