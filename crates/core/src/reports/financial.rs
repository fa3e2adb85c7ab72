//! Financial statements: profit & loss and the headline summary.
//!
//! Both statements are computed from one set of fetched totals. COGS are
//! expenses attributed to a client; operating expenses are company expenses.
//! Cash sales count as both revenue and payment received.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::descriptor::{AssemblyContext, FetchedSources, ReportDescriptor, SourceQuery};
use super::fields;
use super::types::{ColumnSpec, ReportFilter, ReportKind, ReportRow};
use crate::store::Query;

const ORDERS: &str = "sales_orders";
const CASH_SALES: &str = "cash_sales";
const PAYMENTS: &str = "payments";
const EXPENSES: &str = "expenses";

// ============================================================================
// Calculations
// ============================================================================

/// Headline figures derived from four totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    /// Revenue.
    pub total_sales: Decimal,
    /// Cost of goods sold.
    pub total_cogs: Decimal,
    /// Operating expenses.
    pub total_expenses: Decimal,
    /// Sales − COGS.
    pub gross_profit: Decimal,
    /// Gross profit − operating expenses.
    pub operating_profit: Decimal,
    /// Cash actually received.
    pub payments_received: Decimal,
    /// Payments − COGS − operating expenses.
    pub net_income: Decimal,
    /// Sales − payments.
    pub outstanding: Decimal,
}

impl FinancialSummary {
    /// Derives every figure from the four fetched totals.
    #[must_use]
    pub fn compute(sales: Decimal, cogs: Decimal, expenses: Decimal, payments: Decimal) -> Self {
        let gross_profit = sales - cogs;
        Self {
            total_sales: sales,
            total_cogs: cogs,
            total_expenses: expenses,
            gross_profit,
            operating_profit: gross_profit - expenses,
            payments_received: payments,
            net_income: payments - cogs - expenses,
            outstanding: sales - payments,
        }
    }
}

/// Totals fetched once and shared by both statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StatementTotals {
    sales: Decimal,
    cogs: Decimal,
    expenses: Decimal,
    payments: Decimal,
    expenses_by_category: BTreeMap<String, Decimal>,
}

impl StatementTotals {
    fn from_sources(sources: &FetchedSources) -> Self {
        let sum = |label: &str, key: &str| -> Decimal {
            sources.rows(label).iter().map(|r| fields::amount(r, key)).sum()
        };
        let cash_sales = sum(CASH_SALES, "grand_total");

        let mut totals = Self {
            sales: sum(ORDERS, "grand_total") + cash_sales,
            payments: sum(PAYMENTS, "amount") + cash_sales,
            ..Self::default()
        };

        for record in sources.rows(EXPENSES) {
            let amount = fields::amount(record, "amount");
            if fields::id(record, "client_id").is_some() {
                totals.cogs += amount;
            } else {
                totals.expenses += amount;
                let category =
                    fields::text(record, "category").unwrap_or_else(|| "Uncategorised".to_owned());
                *totals.expenses_by_category.entry(category).or_default() += amount;
            }
        }
        totals
    }

    fn summary(&self) -> FinancialSummary {
        FinancialSummary::compute(self.sales, self.cogs, self.expenses, self.payments)
    }
}

fn statement_plan(filter: &ReportFilter) -> Vec<SourceQuery> {
    let scoped = |table: &str, columns: &[&str]| {
        Query::from(table)
            .select(columns.iter().copied())
            .within("date_created", &filter.range)
            .eq_opt("client_id", filter.entity_value())
    };
    vec![
        SourceQuery::new(ORDERS, scoped(ORDERS, &["grand_total"])),
        SourceQuery::new(CASH_SALES, scoped(CASH_SALES, &["grand_total"])),
        SourceQuery::new(PAYMENTS, scoped(PAYMENTS, &["amount"])),
        SourceQuery::new(EXPENSES, scoped(EXPENSES, &["amount", "category", "client_id"])),
    ]
}

fn line(label: &str, amount: Decimal) -> ReportRow {
    ReportRow::new().with("line", label).with("amount", amount)
}

// ============================================================================
// Profit & loss
// ============================================================================

/// Revenue, costs and income for the period.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitLossReport;

impl ReportDescriptor for ProfitLossReport {
    fn kind(&self) -> ReportKind {
        ReportKind::ProfitLoss
    }

    fn title(&self) -> &'static str {
        "Profit & Loss Statement"
    }

    fn columns(&self, _filter: &ReportFilter) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::text("line", "Line"),
            ColumnSpec::money("amount", "Amount"),
            ColumnSpec::percent("share", "% of revenue"),
        ]
    }

    fn plan(&self, filter: &ReportFilter) -> Vec<SourceQuery> {
        statement_plan(filter)
    }

    fn assemble(
        &self,
        _ctx: &AssemblyContext,
        _filter: &ReportFilter,
        sources: &FetchedSources,
    ) -> Vec<ReportRow> {
        if sources.is_empty() {
            return Vec::new();
        }
        let totals = StatementTotals::from_sources(sources);
        let summary = totals.summary();
        let revenue = summary.total_sales;
        let with_share =
            |row: ReportRow, amount: Decimal| row.with("share", fields::percent_of(amount, revenue));

        let mut rows = vec![
            with_share(line("Revenue", revenue), revenue),
            with_share(line("Cost of goods sold", summary.total_cogs), summary.total_cogs),
            with_share(line("Gross profit", summary.gross_profit), summary.gross_profit),
            with_share(
                line("Operating expenses", summary.total_expenses),
                summary.total_expenses,
            ),
        ];
        rows.extend(totals.expenses_by_category.iter().map(|(category, amount)| {
            with_share(line(&format!("  {category}"), *amount), *amount)
        }));
        rows.extend([
            with_share(
                line("Operating income", summary.operating_profit),
                summary.operating_profit,
            ),
            with_share(
                line("Payments received", summary.payments_received),
                summary.payments_received,
            ),
            with_share(line("Net income", summary.net_income), summary.net_income),
        ]);
        rows
    }
}

// ============================================================================
// Financial summary
// ============================================================================

/// Headline figures for the period.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialSummaryReport;

impl ReportDescriptor for FinancialSummaryReport {
    fn kind(&self) -> ReportKind {
        ReportKind::FinancialSummary
    }

    fn title(&self) -> &'static str {
        "Financial Summary"
    }

    fn columns(&self, _filter: &ReportFilter) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::text("line", "Metric"),
            ColumnSpec::money("amount", "Amount"),
        ]
    }

    fn plan(&self, filter: &ReportFilter) -> Vec<SourceQuery> {
        statement_plan(filter)
    }

    fn assemble(
        &self,
        _ctx: &AssemblyContext,
        _filter: &ReportFilter,
        sources: &FetchedSources,
    ) -> Vec<ReportRow> {
        if sources.is_empty() {
            return Vec::new();
        }
        let summary = StatementTotals::from_sources(sources).summary();
        vec![
            line("Total sales", summary.total_sales),
            line("Cost of goods sold", summary.total_cogs),
            line("Operating expenses", summary.total_expenses),
            line("Gross profit", summary.gross_profit),
            line("Operating profit", summary.operating_profit),
            line("Payments received", summary.payments_received),
            line("Net income", summary.net_income),
            line("Outstanding receivables", summary.outstanding),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::reports::types::Cell;
    use crate::store::Record;

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    #[test]
    fn test_summary_scenario() {
        let summary = FinancialSummary::compute(dec!(100000), dec!(40000), dec!(20000), dec!(70000));
        assert_eq!(summary.gross_profit, dec!(60000));
        assert_eq!(summary.operating_profit, dec!(40000));
        assert_eq!(summary.net_income, dec!(10000));
        assert_eq!(summary.outstanding, dec!(30000));
    }

    #[test]
    fn test_totals_split_cogs_from_operating_expenses() {
        let sources = FetchedSources::new()
            .with(ORDERS, records(vec![json!({"grand_total": 50000}), json!({"grand_total": null})]))
            .with(CASH_SALES, records(vec![json!({"grand_total": "10,000"})]))
            .with(PAYMENTS, records(vec![json!({"amount": 30000})]))
            .with(
                EXPENSES,
                records(vec![
                    json!({"amount": 15000, "client_id": "c1", "category": "Timber"}),
                    json!({"amount": 4000, "client_id": null, "category": "Rent"}),
                    json!({"amount": 1000, "category": "Rent"}),
                    json!({"amount": 500}),
                ]),
            );

        let totals = StatementTotals::from_sources(&sources);
        assert_eq!(totals.sales, dec!(60000));
        assert_eq!(totals.payments, dec!(40000));
        assert_eq!(totals.cogs, dec!(15000));
        assert_eq!(totals.expenses, dec!(5500));
        assert_eq!(totals.expenses_by_category["Rent"], dec!(5000));
        assert_eq!(totals.expenses_by_category["Uncategorised"], dec!(500));
    }

    #[test]
    fn test_profit_loss_zero_revenue_percentages() {
        let sources = FetchedSources::new()
            .with(EXPENSES, records(vec![json!({"amount": 2500, "category": "Power"})]))
            .with(ORDERS, Vec::new());
        let filter = ReportFilter::new(
            crate::period::DateRange::new(chrono::DateTime::UNIX_EPOCH, chrono::DateTime::UNIX_EPOCH)
                .unwrap(),
        );
        let ctx = AssemblyContext { tz: chrono_tz::Africa::Nairobi };
        let rows = ProfitLossReport.assemble(&ctx, &filter, &sources);

        assert!(rows.iter().all(|r| *r.get("share") == Cell::text("0.0%")));
        let net = rows.last().unwrap();
        assert_eq!(net.get("line"), &Cell::text("Net income"));
        assert_eq!(net.get("amount").as_decimal(), Some(dec!(-2500)));
    }

    #[test]
    fn test_statements_empty_without_records() {
        let sources = FetchedSources::new().with(ORDERS, Vec::new()).with(PAYMENTS, Vec::new());
        let filter = ReportFilter::new(
            crate::period::DateRange::new(chrono::DateTime::UNIX_EPOCH, chrono::DateTime::UNIX_EPOCH)
                .unwrap(),
        );
        let ctx = AssemblyContext { tz: chrono_tz::Africa::Nairobi };
        assert!(ProfitLossReport.assemble(&ctx, &filter, &sources).is_empty());
        assert!(FinancialSummaryReport.assemble(&ctx, &filter, &sources).is_empty());
    }
}
