//! Inventory report: stock on hand with movements in the period.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::descriptor::{AssemblyContext, FetchedSources, ReportDescriptor, SourceQuery};
use super::fields;
use super::types::{ColumnSpec, ReportFilter, ReportKind, ReportRow};
use crate::store::Query;

const ITEMS: &str = "stock_items";
const MOVEMENTS: &str = "stock_movements";

/// Stock valuation and low-stock listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryReport;

#[derive(Default)]
struct Movement {
    received: Decimal,
    issued: Decimal,
}

impl ReportDescriptor for InventoryReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Inventory
    }

    fn title(&self) -> &'static str {
        "Inventory Report"
    }

    fn sub_types(&self) -> &'static [&'static str] {
        &["valuation", "low_stock"]
    }

    fn columns(&self, _filter: &ReportFilter) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::text("item", "Item"),
            ColumnSpec::text("category", "Category"),
            ColumnSpec::text("unit", "Unit"),
            ColumnSpec::quantity("quantity", "Quantity"),
            ColumnSpec::money("unit_cost", "Unit cost"),
            ColumnSpec::money("value", "Stock value").totalled(),
            ColumnSpec::quantity("received", "Received").totalled(),
            ColumnSpec::quantity("issued", "Issued").totalled(),
            ColumnSpec::text("status", "Status").aligned(super::types::Align::Center),
        ]
    }

    fn plan(&self, filter: &ReportFilter) -> Vec<SourceQuery> {
        vec![
            SourceQuery::new(
                ITEMS,
                Query::from(ITEMS)
                    .select(["id", "name", "category", "unit", "quantity", "unit_price", "reorder_level"])
                    .order_asc("name"),
            ),
            SourceQuery::new(
                MOVEMENTS,
                Query::from(MOVEMENTS)
                    .select(["stock_item_id", "movement_type", "quantity", "date_created"])
                    .within("date_created", &filter.range),
            ),
        ]
    }

    fn assemble(
        &self,
        _ctx: &AssemblyContext,
        filter: &ReportFilter,
        sources: &FetchedSources,
    ) -> Vec<ReportRow> {
        let mut movements: HashMap<String, Movement> = HashMap::new();
        for record in sources.rows(MOVEMENTS) {
            let Some(item) = fields::id(record, "stock_item_id") else {
                continue;
            };
            let entry = movements.entry(item).or_default();
            let quantity = fields::amount(record, "quantity");
            match fields::text(record, "movement_type").as_deref() {
                Some("in") => entry.received += quantity,
                Some("out") => entry.issued += quantity,
                _ => {}
            }
        }

        let low_only = filter.is_sub_type("low_stock");
        sources
            .rows(ITEMS)
            .iter()
            .filter_map(|record| {
                let quantity = fields::amount(record, "quantity");
                let unit_cost = fields::amount(record, "unit_price");
                let low = quantity <= fields::amount(record, "reorder_level");
                if low_only && !low {
                    return None;
                }
                let moved = fields::id(record, "id")
                    .and_then(|id| movements.get(&id))
                    .map_or((Decimal::ZERO, Decimal::ZERO), |m| (m.received, m.issued));
                Some(
                    ReportRow::new()
                        .with("item", fields::text_or_missing(record, "name"))
                        .with("category", fields::text_or_missing(record, "category"))
                        .with("unit", fields::text_or_missing(record, "unit"))
                        .with("quantity", quantity)
                        .with("unit_cost", unit_cost)
                        .with("value", quantity * unit_cost)
                        .with("received", moved.0)
                        .with("issued", moved.1)
                        .with("status", if low { "Low" } else { "OK" }),
                )
            })
            .collect()
    }
}
