//! Client balances.
//!
//! One query per metric over all clients, folded client-side by `client_id`.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::descriptor::{AssemblyContext, FetchedSources, ReportDescriptor, SourceQuery};
use super::fields;
use super::types::{ColumnSpec, ReportFilter, ReportKind, ReportRow};
use crate::store::{Query, Record};

const CLIENTS: &str = "clients";
const ORDERS: &str = "sales_orders";
const PAYMENTS: &str = "payments";
const EXPENSES: &str = "expenses";

/// Orders, payments, expenses and outstanding balance per client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientsReport;

/// Sums `amount_key` per `client_id`.
fn fold_by_client(records: &[Record], amount_key: &str) -> HashMap<String, Decimal> {
    let mut totals: HashMap<String, Decimal> = HashMap::new();
    for record in records {
        if let Some(client) = fields::id(record, "client_id") {
            *totals.entry(client).or_default() += fields::amount(record, amount_key);
        }
    }
    totals
}

fn metric_query(table: &str, amount_key: &str, filter: &ReportFilter) -> Query {
    Query::from(table)
        .select(["client_id", amount_key])
        .not_null("client_id")
        .within("date_created", &filter.range)
        .eq_opt("client_id", filter.entity_value())
}

impl ReportDescriptor for ClientsReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Clients
    }

    fn title(&self) -> &'static str {
        "Client Balances"
    }

    fn sub_types(&self) -> &'static [&'static str] {
        &["balances"]
    }

    fn columns(&self, _filter: &ReportFilter) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::text("client", "Client"),
            ColumnSpec::text("phone", "Phone"),
            ColumnSpec::money("orders", "Orders").totalled(),
            ColumnSpec::money("payments", "Payments").totalled(),
            ColumnSpec::money("expenses", "Expenses").totalled(),
            ColumnSpec::money("balance", "Balance").totalled(),
        ]
    }

    fn plan(&self, filter: &ReportFilter) -> Vec<SourceQuery> {
        vec![
            SourceQuery::new(
                CLIENTS,
                Query::from(CLIENTS)
                    .select(["id", "name", "phone"])
                    .eq_opt("id", filter.entity_value())
                    .order_asc("name"),
            ),
            SourceQuery::new(ORDERS, metric_query(ORDERS, "grand_total", filter)),
            SourceQuery::new(PAYMENTS, metric_query(PAYMENTS, "amount", filter)),
            SourceQuery::new(EXPENSES, metric_query(EXPENSES, "amount", filter)),
        ]
    }

    fn assemble(
        &self,
        _ctx: &AssemblyContext,
        _filter: &ReportFilter,
        sources: &FetchedSources,
    ) -> Vec<ReportRow> {
        let orders = fold_by_client(sources.rows(ORDERS), "grand_total");
        let payments = fold_by_client(sources.rows(PAYMENTS), "amount");
        let expenses = fold_by_client(sources.rows(EXPENSES), "amount");
        let metric = |map: &HashMap<String, Decimal>, id: Option<&str>| {
            id.and_then(|id| map.get(id))
                .copied()
                .unwrap_or(Decimal::ZERO)
        };

        sources
            .rows(CLIENTS)
            .iter()
            .map(|client| {
                let id = fields::id(client, "id");
                let ordered = metric(&orders, id.as_deref());
                let paid = metric(&payments, id.as_deref());
                ReportRow::new()
                    .with("client", fields::text_or_missing(client, "name"))
                    .with("phone", fields::text_or_missing(client, "phone"))
                    .with("orders", ordered)
                    .with("payments", paid)
                    .with("expenses", metric(&expenses, id.as_deref()))
                    .with("balance", ordered - paid)
            })
            .collect()
    }
}
