//! Expenses report.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::descriptor::{AssemblyContext, FetchedSources, ReportDescriptor, SourceQuery};
use super::fields;
use super::types::{ColumnSpec, ReportFilter, ReportKind, ReportRow};
use crate::store::Query;

const SOURCE: &str = "expenses";
const UNCATEGORISED: &str = "Uncategorised";

/// Company and client-attributable expenses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpensesReport;

impl ReportDescriptor for ExpensesReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Expenses
    }

    fn title(&self) -> &'static str {
        "Expenses Report"
    }

    fn sub_types(&self) -> &'static [&'static str] {
        &["detailed", "by_category"]
    }

    fn include_flags(&self) -> &'static [&'static str] {
        &["company", "client"]
    }

    fn columns(&self, filter: &ReportFilter) -> Vec<ColumnSpec> {
        if filter.is_sub_type("by_category") {
            vec![
                ColumnSpec::text("category", "Category"),
                ColumnSpec::quantity("entries", "Entries").totalled(),
                ColumnSpec::money("amount", "Amount").totalled(),
                ColumnSpec::percent("share", "Share"),
            ]
        } else {
            vec![
                ColumnSpec::date("date", "Date"),
                ColumnSpec::text("reference", "Reference"),
                ColumnSpec::text("category", "Category"),
                ColumnSpec::text("description", "Description"),
                ColumnSpec::text("client", "Client"),
                ColumnSpec::money("amount", "Amount").totalled(),
            ]
        }
    }

    fn plan(&self, filter: &ReportFilter) -> Vec<SourceQuery> {
        let mut query = Query::from("expenses")
            .select([
                "id",
                "expense_number",
                "category",
                "description",
                "amount",
                "client_id",
                "date_created",
            ])
            .embed("client", "clients", "client_id", ["name"])
            .within("date_created", &filter.range)
            .eq_opt("client_id", filter.entity_value())
            .order_asc("date_created");

        match (filter.includes("company"), filter.includes("client")) {
            (true, false) => query = query.is_null("client_id"),
            (false, true) => query = query.not_null("client_id"),
            _ => {}
        }

        vec![SourceQuery::new(SOURCE, query)]
    }

    fn assemble(
        &self,
        ctx: &AssemblyContext,
        filter: &ReportFilter,
        sources: &FetchedSources,
    ) -> Vec<ReportRow> {
        let records = sources.rows(SOURCE);

        if !filter.is_sub_type("by_category") {
            return records
                .iter()
                .map(|record| {
                    ReportRow::new()
                        .with("date", fields::local_date(record, "date_created", ctx.tz))
                        .with("reference", fields::text_or_missing(record, "expense_number"))
                        .with("category", category(record))
                        .with("description", fields::text(record, "description").unwrap_or_default())
                        .with("client", fields::embedded(record, "client", "name"))
                        .with("amount", fields::amount(record, "amount"))
                })
                .collect();
        }

        let mut by_category: BTreeMap<String, (usize, Decimal)> = BTreeMap::new();
        for record in records {
            let entry = by_category.entry(category(record)).or_default();
            entry.0 += 1;
            entry.1 += fields::amount(record, "amount");
        }
        let total: Decimal = by_category.values().map(|(_, amount)| *amount).sum();

        let mut groups: Vec<(String, usize, Decimal)> = by_category
            .into_iter()
            .map(|(name, (entries, amount))| (name, entries, amount))
            .collect();
        groups.sort_by(|a, b| b.2.cmp(&a.2));

        groups
            .into_iter()
            .map(|(name, entries, amount)| {
                ReportRow::new()
                    .with("category", name)
                    .with("entries", entries)
                    .with("amount", amount)
                    .with("share", fields::percent_of(amount, total))
            })
            .collect()
    }
}

fn category(record: &crate::store::Record) -> String {
    fields::text(record, "category").unwrap_or_else(|| UNCATEGORISED.to_owned())
}
