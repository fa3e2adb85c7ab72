//! Sales report: quotations, orders, invoices and cash sales.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::descriptor::{
    AssemblyContext, FailurePolicy, FetchedSources, ReportDescriptor, SourceQuery,
};
use super::fields;
use super::types::{ColumnSpec, ReportFilter, ReportKind, ReportRow};
use crate::store::{Query, Record};

/// One sales document table.
struct SalesSource {
    flag: &'static str,
    table: &'static str,
    label: &'static str,
    number_column: &'static str,
    /// Fixed status for tables without a status column.
    status: Option<&'static str>,
}

const SOURCES: [SalesSource; 4] = [
    SalesSource {
        flag: "quotations",
        table: "quotations",
        label: "Quotation",
        number_column: "quotation_number",
        status: None,
    },
    SalesSource {
        flag: "orders",
        table: "sales_orders",
        label: "Sales order",
        number_column: "order_number",
        status: None,
    },
    SalesSource {
        flag: "invoices",
        table: "invoices",
        label: "Invoice",
        number_column: "invoice_number",
        status: None,
    },
    SalesSource {
        flag: "cash_sales",
        table: "cash_sales",
        label: "Cash sale",
        number_column: "receipt_number",
        status: Some("paid"),
    },
];

/// Sales documents raised in the period.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalesReport;

impl SalesReport {
    fn detailed(ctx: &AssemblyContext, sources: &FetchedSources) -> Vec<ReportRow> {
        let mut entries: Vec<(Option<DateTime<Utc>>, ReportRow)> = Vec::new();
        for source in &SOURCES {
            for record in sources.rows(source.flag) {
                let status = source
                    .status
                    .map_or_else(|| fields::text_or_missing(record, "status"), str::to_owned);
                let row = ReportRow::new()
                    .with("date", fields::local_date(record, "date_created", ctx.tz))
                    .with("reference", fields::text_or_missing(record, source.number_column))
                    .with("source", source.label)
                    .with("client", fields::embedded(record, "client", "name"))
                    .with("status", status)
                    .with("amount", fields::amount(record, "grand_total"));
                entries.push((fields::timestamp(record, "date_created"), row));
            }
        }
        // Stable: documents on the same instant keep source order. Undated last.
        entries.sort_by_key(|(at, _)| (at.is_none(), *at));
        entries.into_iter().map(|(_, row)| row).collect()
    }

    fn by_client(sources: &FetchedSources) -> Vec<ReportRow> {
        struct Group {
            name: String,
            documents: usize,
            amount: Decimal,
        }

        let mut order: Vec<String> = Vec::new();
        let mut groups: BTreeMap<String, Group> = BTreeMap::new();
        let records = SOURCES
            .iter()
            .flat_map(|source| sources.rows(source.flag).iter());
        for record in records {
            let key = client_key(record);
            let group = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Group {
                    name: fields::embedded(record, "client", "name"),
                    documents: 0,
                    amount: Decimal::ZERO,
                }
            });
            group.documents += 1;
            group.amount += fields::amount(record, "grand_total");
        }

        let grand_total: Decimal = groups.values().map(|g| g.amount).sum();
        let mut ranked: Vec<&Group> = order.iter().filter_map(|key| groups.get(key)).collect();
        ranked.sort_by(|a, b| b.amount.cmp(&a.amount));

        ranked
            .into_iter()
            .map(|group| {
                ReportRow::new()
                    .with("client", group.name.as_str())
                    .with("documents", group.documents)
                    .with("amount", group.amount)
                    .with("share", fields::percent_of(group.amount, grand_total))
            })
            .collect()
    }
}

fn client_key(record: &Record) -> String {
    fields::id(record, "client_id").unwrap_or_default()
}

impl ReportDescriptor for SalesReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Sales
    }

    fn title(&self) -> &'static str {
        "Sales Report"
    }

    fn sub_types(&self) -> &'static [&'static str] {
        &["detailed", "by_client"]
    }

    fn include_flags(&self) -> &'static [&'static str] {
        &["quotations", "orders", "invoices", "cash_sales"]
    }

    fn default_includes(&self) -> &'static [&'static str] {
        &["orders", "invoices", "cash_sales"]
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::DegradeSection
    }

    fn columns(&self, filter: &ReportFilter) -> Vec<ColumnSpec> {
        if filter.is_sub_type("by_client") {
            vec![
                ColumnSpec::text("client", "Client"),
                ColumnSpec::quantity("documents", "Documents").totalled(),
                ColumnSpec::money("amount", "Amount").totalled(),
                ColumnSpec::percent("share", "Share"),
            ]
        } else {
            vec![
                ColumnSpec::date("date", "Date"),
                ColumnSpec::text("reference", "Reference"),
                ColumnSpec::text("source", "Type"),
                ColumnSpec::text("client", "Client"),
                ColumnSpec::text("status", "Status"),
                ColumnSpec::money("amount", "Amount").totalled(),
            ]
        }
    }

    fn plan(&self, filter: &ReportFilter) -> Vec<SourceQuery> {
        SOURCES
            .iter()
            .filter(|source| filter.includes(source.flag))
            .map(|source| {
                let mut columns = vec!["id", "client_id", "grand_total", "date_created", source.number_column];
                if source.status.is_none() {
                    columns.push("status");
                }
                let query = Query::from(source.table)
                    .select(columns)
                    .embed("client", "clients", "client_id", ["name"])
                    .within("date_created", &filter.range)
                    .eq_opt("client_id", filter.entity_value())
                    .order_asc("date_created");
                SourceQuery::new(source.flag, query)
            })
            .collect()
    }

    fn assemble(
        &self,
        ctx: &AssemblyContext,
        filter: &ReportFilter,
        sources: &FetchedSources,
    ) -> Vec<ReportRow> {
        if filter.is_sub_type("by_client") {
            Self::by_client(sources)
        } else {
            Self::detailed(ctx, sources)
        }
    }
}
