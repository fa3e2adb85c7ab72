//! Report data types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use kabati_shared::types::{ClientId, ReportRunId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::DateRange;

// ============================================================================
// Cells and rows
// ============================================================================

/// A scalar report value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value; rendered as an empty field.
    #[default]
    Null,
    /// Numeric value.
    Number(Decimal),
    /// Text value.
    Text(String),
}

impl Cell {
    /// Creates a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the numeric value, if any.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Unformatted string form: empty for null, normalised digits for numbers.
    #[must_use]
    pub fn plain(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Number(n) => n.normalize().to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

static NULL_CELL: Cell = Cell::Null;

/// One output row, keyed by column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReportRow(BTreeMap<String, Cell>);

impl ReportRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Cell>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a value.
    pub fn set(&mut self, key: &str, value: impl Into<Cell>) {
        self.0.insert(key.to_owned(), value.into());
    }

    /// Value for `key`, `Null` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &Cell {
        self.0.get(key).unwrap_or(&NULL_CELL)
    }

    /// Keys present in this row.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Restricts the row to exactly the declared columns, filling gaps with `Null`.
    #[must_use]
    pub fn project(mut self, columns: &[ColumnSpec]) -> Self {
        let mut out = BTreeMap::new();
        for column in columns {
            let cell = self.0.remove(&column.key).unwrap_or_default();
            out.insert(column.key.clone(), cell);
        }
        Self(out)
    }
}

// ============================================================================
// Columns
// ============================================================================

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Left aligned.
    #[default]
    Left,
    /// Right aligned.
    Right,
    /// Centred.
    Center,
}

impl Align {
    /// CSS `text-align` value.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

/// How a column's values are formatted for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Free text.
    #[default]
    Text,
    /// Currency amount.
    Money,
    /// Count or quantity.
    Quantity,
    /// Pre-formatted percentage text.
    Percent,
    /// Pre-formatted date text.
    Date,
}

/// Declares one output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Row key.
    pub key: String,
    /// Header label.
    pub label: String,
    /// Alignment.
    pub align: Align,
    /// Display format.
    pub kind: ColumnKind,
    /// Whether the column is summed into the totals.
    pub total: bool,
}

impl ColumnSpec {
    fn new(key: &str, label: &str, align: Align, kind: ColumnKind) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
            align,
            kind,
            total: false,
        }
    }

    /// Left-aligned text column.
    #[must_use]
    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, Align::Left, ColumnKind::Text)
    }

    /// Right-aligned money column.
    #[must_use]
    pub fn money(key: &str, label: &str) -> Self {
        Self::new(key, label, Align::Right, ColumnKind::Money)
    }

    /// Right-aligned quantity column.
    #[must_use]
    pub fn quantity(key: &str, label: &str) -> Self {
        Self::new(key, label, Align::Right, ColumnKind::Quantity)
    }

    /// Right-aligned percentage column.
    #[must_use]
    pub fn percent(key: &str, label: &str) -> Self {
        Self::new(key, label, Align::Right, ColumnKind::Percent)
    }

    /// Date column.
    #[must_use]
    pub fn date(key: &str, label: &str) -> Self {
        Self::new(key, label, Align::Left, ColumnKind::Date)
    }

    /// Marks the column as summed into the totals.
    #[must_use]
    pub fn totalled(mut self) -> Self {
        self.total = true;
        self
    }

    /// Overrides the alignment.
    #[must_use]
    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

// ============================================================================
// Report kinds and filters
// ============================================================================

/// The available reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Quotations, orders, invoices and cash sales.
    Sales,
    /// Company and client expenses.
    Expenses,
    /// Stock valuation and movements.
    Inventory,
    /// Per-client balances.
    Clients,
    /// Profit and loss statement.
    ProfitLoss,
    /// Headline financial figures.
    FinancialSummary,
    /// Account transactions with running balance.
    CashBook,
}

impl ReportKind {
    /// All kinds in catalogue order.
    pub const ALL: [Self; 7] = [
        Self::Sales,
        Self::Expenses,
        Self::Inventory,
        Self::Clients,
        Self::ProfitLoss,
        Self::FinancialSummary,
        Self::CashBook,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Expenses => "expenses",
            Self::Inventory => "inventory",
            Self::Clients => "clients",
            Self::ProfitLoss => "profit_loss",
            Self::FinancialSummary => "financial_summary",
            Self::CashBook => "cash_book",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown report type: {s}"))
    }
}

/// User-selected parameters for one report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFilter {
    /// Period covered.
    pub range: DateRange,
    /// Restrict to one client.
    pub entity_id: Option<ClientId>,
    /// Report variant; `None` selects the report's default.
    pub sub_type: Option<String>,
    /// Optional sections to include; empty selects the report's defaults.
    pub include_flags: BTreeSet<String>,
}

impl ReportFilter {
    /// Filter over `range` with every other option at its default.
    #[must_use]
    pub const fn new(range: DateRange) -> Self {
        Self {
            range,
            entity_id: None,
            sub_type: None,
            include_flags: BTreeSet::new(),
        }
    }

    /// Restricts to one client.
    #[must_use]
    pub fn for_client(mut self, client: ClientId) -> Self {
        self.entity_id = Some(client);
        self
    }

    /// Selects a report variant.
    #[must_use]
    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    /// Adds an include flag.
    #[must_use]
    pub fn include(mut self, flag: impl Into<String>) -> Self {
        self.include_flags.insert(flag.into());
        self
    }

    /// True if the flag is set.
    #[must_use]
    pub fn includes(&self, flag: &str) -> bool {
        self.include_flags.contains(flag)
    }

    /// True if the sub-type equals `name`.
    #[must_use]
    pub fn is_sub_type(&self, name: &str) -> bool {
        self.sub_type.as_deref() == Some(name)
    }

    /// Entity id as a store value.
    #[must_use]
    pub fn entity_value(&self) -> Option<String> {
        self.entity_id.map(|id| id.to_string())
    }
}

// ============================================================================
// Results
// ============================================================================

/// Non-fatal conditions attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportWarning {
    /// The filter matched no source records.
    NoData,
    /// A source failed and its section is missing from the rows and totals.
    SectionUnavailable {
        /// Source label.
        section: String,
        /// Failure reason.
        message: String,
    },
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => f.write_str("No data for the selected period"),
            Self::SectionUnavailable { section, message } => {
                write!(f, "{section} could not be loaded and is excluded: {message}")
            }
        }
    }
}

/// A generated report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportResult {
    /// Unique id of this run.
    pub run_id: ReportRunId,
    /// Report kind.
    pub kind: ReportKind,
    /// Display title.
    pub title: String,
    /// Period covered.
    pub period: DateRange,
    /// Human-readable period.
    pub period_label: String,
    /// Output columns in display order.
    pub columns: Vec<ColumnSpec>,
    /// Rows in display order; each has exactly the declared columns.
    pub rows: Vec<ReportRow>,
    /// Sums of totalled columns; `None` when no column is totalled.
    pub totals: Option<BTreeMap<String, Decimal>>,
    /// Non-fatal conditions.
    pub warnings: Vec<ReportWarning>,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
}

impl ReportResult {
    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if any section is missing.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, ReportWarning::SectionUnavailable { .. }))
    }

    /// Total for a column, if it is totalled.
    #[must_use]
    pub fn total(&self, key: &str) -> Option<Decimal> {
        self.totals.as_ref()?.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_project_fills_and_drops() {
        let columns = vec![ColumnSpec::text("a", "A"), ColumnSpec::money("b", "B")];
        let row = ReportRow::new().with("a", "x").with("extra", "y").project(&columns);

        assert_eq!(row.get("a"), &Cell::text("x"));
        assert_eq!(row.get("b"), &Cell::Null);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_cell_plain() {
        assert_eq!(Cell::Null.plain(), "");
        assert_eq!(Cell::from(dec!(1500.00)).plain(), "1500");
        assert_eq!(Cell::from(dec!(-2.50)).plain(), "-2.5");
        assert_eq!(Cell::from(None::<String>), Cell::Null);
    }

    #[rstest]
    #[case("sales", ReportKind::Sales)]
    #[case("profit-loss", ReportKind::ProfitLoss)]
    #[case("Cash_Book", ReportKind::CashBook)]
    #[case(" financial_summary ", ReportKind::FinancialSummary)]
    fn test_kind_parse(#[case] input: &str, #[case] expected: ReportKind) {
        assert_eq!(input.parse::<ReportKind>(), Ok(expected));
    }

    #[test]
    fn test_kind_parse_unknown() {
        assert!("payroll".parse::<ReportKind>().is_err());
    }

    #[test]
    fn test_cell_serializes_untagged() {
        let row = ReportRow::new()
            .with("amount", dec!(10.5))
            .with("client", "-")
            .with("note", Cell::Null);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["client"], "-");
        assert!(json["note"].is_null());
    }
}
