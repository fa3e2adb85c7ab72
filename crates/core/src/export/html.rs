//! Printable HTML sink.
//!
//! Produces one self-contained document: inline styles, a header block, a
//! single aligned table with an optional totals footer. Opening a window or a
//! print dialog is left to the caller.

use std::fmt::Write as _;

use chrono_tz::Tz;
use kabati_shared::types::{Currency, Money};
use kabati_shared::types::money::group_thousands;

use crate::reports::{Cell, ColumnKind, ColumnSpec, ReportResult, ReportRow, ReportWarning};

const CSS: &str = r"
body { font-family: 'Helvetica Neue', Arial, sans-serif; color: #222; margin: 24px; }
header { border-bottom: 2px solid #333; margin-bottom: 16px; padding-bottom: 8px; }
header h1 { font-size: 20px; margin: 0; }
header h2 { font-size: 16px; margin: 4px 0; font-weight: normal; }
header p { margin: 2px 0; color: #555; font-size: 12px; }
table { width: 100%; border-collapse: collapse; font-size: 12px; }
th, td { border: 1px solid #ccc; padding: 4px 6px; }
th { background: #f0f0f0; }
tfoot td { font-weight: bold; background: #fafafa; }
.warnings { color: #8a4b00; font-size: 12px; }
.empty { text-align: center; color: #777; padding: 12px; }
@media print { body { margin: 0; } }
";

/// Presentation settings for printable documents.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Name shown above the title.
    pub company_name: String,
    /// Currency for money columns.
    pub currency: Currency,
    /// External stylesheet linked from `<head>`.
    pub stylesheet_href: Option<String>,
    /// Emit a script that opens the print dialog on load.
    pub auto_print: bool,
    /// Timezone for the generation timestamp.
    pub tz: Tz,
}

/// Escapes text for element content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Display text for one cell under a column's format.
#[must_use]
pub fn format_cell(cell: &Cell, kind: ColumnKind, currency: Currency) -> String {
    match (cell, kind) {
        (Cell::Number(n), ColumnKind::Money) => Money::new(*n, currency).to_string(),
        (Cell::Number(n), ColumnKind::Quantity) => {
            let n = n.normalize();
            group_thousands(n, n.scale())
        }
        _ => cell.plain(),
    }
}

/// Renders the table markup: header, body rows in order, and a totals footer.
#[must_use]
pub fn render_table(
    columns: &[ColumnSpec],
    rows: &[ReportRow],
    totals: Option<&std::collections::BTreeMap<String, rust_decimal::Decimal>>,
    currency: Currency,
) -> String {
    let mut html = String::from("<table>\n<thead><tr>");
    for column in columns {
        let _ = write!(
            html,
            "<th style=\"text-align:{}\">{}</th>",
            column.align.as_css(),
            escape_html(&column.label)
        );
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    if rows.is_empty() {
        let _ = writeln!(
            html,
            "<tr><td class=\"empty\" colspan=\"{}\">No data for the selected period</td></tr>",
            columns.len().max(1)
        );
    }
    for row in rows {
        html.push_str("<tr>");
        for column in columns {
            let text = format_cell(row.get(&column.key), column.kind, currency);
            let _ = write!(
                html,
                "<td style=\"text-align:{}\">{}</td>",
                column.align.as_css(),
                escape_html(&text)
            );
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n");

    if let Some(totals) = totals {
        html.push_str("<tfoot><tr>");
        for (i, column) in columns.iter().enumerate() {
            let text = match totals.get(&column.key) {
                Some(total) => format_cell(&Cell::Number(*total), column.kind, currency),
                None if i == 0 => "Total".to_owned(),
                None => String::new(),
            };
            let _ = write!(
                html,
                "<td style=\"text-align:{}\">{}</td>",
                column.align.as_css(),
                escape_html(&text)
            );
        }
        html.push_str("</tr></tfoot>\n");
    }

    html.push_str("</table>");
    html
}

/// Renders a complete printable document for a result.
#[must_use]
pub fn render_document(result: &ReportResult, options: &PrintOptions) -> String {
    let stylesheet = options
        .stylesheet_href
        .as_deref()
        .map(|href| format!("<link rel=\"stylesheet\" href=\"{}\">\n", escape_html(href)))
        .unwrap_or_default();

    let warnings: Vec<String> = result
        .warnings
        .iter()
        .filter(|w| !matches!(w, ReportWarning::NoData))
        .map(|w| format!("<li>{}</li>", escape_html(&w.to_string())))
        .collect();
    let warnings = if warnings.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"warnings\">{}</ul>\n", warnings.join(""))
    };

    let script = if options.auto_print {
        "<script>window.onload = function () { window.print(); };</script>\n"
    } else {
        ""
    };

    let generated = result
        .generated_at
        .with_timezone(&options.tz)
        .format("%d %b %Y %H:%M");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
{stylesheet}<style>{css}</style>
</head>
<body>
<header>
<h1>{company}</h1>
<h2>{title}</h2>
<p>Period: {period}</p>
<p>Generated: {generated}</p>
</header>
{warnings}{table}
{script}</body>
</html>
"#,
        title = escape_html(&result.title),
        company = escape_html(&options.company_name),
        period = escape_html(&result.period_label),
        css = CSS,
        table = render_table(
            &result.columns,
            &result.rows,
            result.totals.as_ref(),
            options.currency
        ),
    )
}
