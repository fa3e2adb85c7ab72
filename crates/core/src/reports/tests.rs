//! Pipeline tests for the report catalogue.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Africa::Nairobi;
use kabati_shared::types::ClientId;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use super::cash_book::{CashEntry, running_balances};
use super::*;
use crate::period::DateRange;
use crate::store::{MemoryStore, StoreError};

fn march() -> DateRange {
    DateRange::new(
        Utc.with_ymd_and_hms(2026, 2, 28, 21, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 31, 21, 0, 0).unwrap(),
    )
    .unwrap()
}

fn aggregator(store: MemoryStore) -> ReportAggregator {
    ReportAggregator::new(Arc::new(store), Nairobi)
}

async fn run(store: MemoryStore, kind: ReportKind, filter: ReportFilter) -> Result<ReportResult, ReportError> {
    let registry = ReportRegistry::standard();
    let descriptor = registry.get(kind)?;
    aggregator(store).aggregate(descriptor.as_ref(), &filter).await
}

fn sales_store(client: ClientId, other: ClientId) -> MemoryStore {
    MemoryStore::new()
        .with_table(
            "clients",
            vec![
                json!({"id": client.to_string(), "name": "Amani Interiors", "phone": "0700000001"}),
                json!({"id": other.to_string(), "name": "Baraka Homes", "phone": "0700000002"}),
            ],
        )
        .with_table("quotations", vec![])
        .with_table(
            "sales_orders",
            vec![json!({"id": 1, "order_number": "SO-001", "client_id": client.to_string(), "status": "confirmed", "grand_total": 40000, "date_created": "2026-03-03T09:00:00Z"})],
        )
        .with_table(
            "invoices",
            vec![json!({"id": 1, "invoice_number": "INV-001", "client_id": client.to_string(), "status": "unpaid", "grand_total": 12000, "date_created": "2026-03-04T09:00:00Z"})],
        )
        .with_table(
            "cash_sales",
            vec![
                json!({"id": 1, "receipt_number": "CS-001", "client_id": client.to_string(), "grand_total": 1000, "date_created": "2026-03-05T09:00:00Z"}),
                json!({"id": 2, "receipt_number": "CS-002", "client_id": client.to_string(), "grand_total": "2,500", "date_created": "2026-03-06T09:00:00Z"}),
                json!({"id": 3, "receipt_number": "CS-003", "client_id": other.to_string(), "grand_total": 9999, "date_created": "2026-03-06T10:00:00Z"}),
                json!({"id": 4, "receipt_number": "CS-004", "client_id": client.to_string(), "grand_total": 700, "date_created": "2026-04-02T10:00:00Z"}),
            ],
        )
}

// ============================================================================
// Sales
// ============================================================================

#[tokio::test]
async fn test_sales_cash_sales_only_for_one_client() {
    let client = ClientId::new();
    let filter = ReportFilter::new(march()).for_client(client).include("cash_sales");

    let result = run(sales_store(client, ClientId::new()), ReportKind::Sales, filter)
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.total("amount"), Some(dec!(3500)));
    assert!(result.warnings.is_empty());
    assert_eq!(result.rows[0].get("reference"), &Cell::text("CS-001"));
    assert_eq!(result.rows[1].get("client"), &Cell::text("Amani Interiors"));
}

#[tokio::test]
async fn test_sales_default_flags_skip_quotations() {
    let client = ClientId::new();
    let store = sales_store(client, ClientId::new()).failing("quotations");
    let result = run(store, ReportKind::Sales, ReportFilter::new(march()))
        .await
        .unwrap();

    // Quotations are not requested by default, so the failing table is never hit.
    assert!(!result.is_degraded());
    assert_eq!(result.rows.len(), 5);
    assert_eq!(result.total("amount"), Some(dec!(65499)));
}

#[tokio::test]
async fn test_sales_degrades_failed_section() {
    let client = ClientId::new();
    let store = sales_store(client, ClientId::new()).failing("invoices");
    let result = run(store, ReportKind::Sales, ReportFilter::new(march()).for_client(client))
        .await
        .unwrap();

    assert!(result.is_degraded());
    assert!(result.warnings.iter().any(|w| matches!(
        w,
        ReportWarning::SectionUnavailable { section, .. } if section == "invoices"
    )));
    assert_eq!(result.total("amount"), Some(dec!(43500)));
}

#[tokio::test]
async fn test_sales_all_sections_failed_is_an_error() {
    let store = MemoryStore::new().failing("cash_sales");
    let filter = ReportFilter::new(march()).include("cash_sales");
    assert_eq!(
        run(store, ReportKind::Sales, filter).await.unwrap_err(),
        ReportError::AllSectionsFailed
    );
}

#[tokio::test]
async fn test_sales_by_client_groups_and_shares() {
    let client = ClientId::new();
    let filter = ReportFilter::new(march())
        .with_sub_type("by_client")
        .include("cash_sales");
    let result = run(sales_store(client, ClientId::new()), ReportKind::Sales, filter)
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0].get("client"), &Cell::text("Baraka Homes"));
    assert_eq!(result.rows[1].get("documents").as_decimal(), Some(dec!(2)));
    assert_eq!(result.total("documents"), Some(dec!(3)));
    assert_eq!(result.rows[1].get("share"), &Cell::text("25.9%"));
}

#[tokio::test]
async fn test_unsupported_options_rejected_before_fetch() {
    let store = Arc::new(MemoryStore::new());
    let agg = ReportAggregator::new(store.clone(), Nairobi);
    let registry = ReportRegistry::standard();
    let sales = registry.get(ReportKind::Sales).unwrap();

    let bad_sub = ReportFilter::new(march()).with_sub_type("weekly");
    assert!(matches!(
        agg.aggregate(sales.as_ref(), &bad_sub).await,
        Err(ReportError::InvalidFilter(_))
    ));
    let bad_flag = ReportFilter::new(march()).include("refunds");
    assert!(matches!(
        agg.aggregate(sales.as_ref(), &bad_flag).await,
        Err(ReportError::InvalidFilter(_))
    ));
    assert_eq!(store.fetch_count(), 0);
}

// ============================================================================
// Expenses
// ============================================================================

fn expenses_store() -> MemoryStore {
    let client = ClientId::new().to_string();
    MemoryStore::new()
        .with_table("clients", vec![json!({"id": client, "name": "Amani Interiors"})])
        .with_table(
            "expenses",
            vec![
                json!({"id": 1, "expense_number": "EXP-1", "category": "Timber", "description": "MDF sheets", "amount": 30000, "client_id": client, "date_created": "2026-03-02T08:00:00Z"}),
                json!({"id": 2, "expense_number": "EXP-2", "category": "Rent", "description": "Workshop rent", "amount": 50000, "client_id": null, "date_created": "2026-03-01T08:00:00Z"}),
                json!({"id": 3, "category": "Timber", "amount": null, "client_id": null, "date_created": "2026-03-10T08:00:00Z"}),
                json!({"id": 4, "category": "Power", "amount": "20,000", "client_id": null, "date_created": "2026-03-11T08:00:00Z"}),
            ],
        )
}

#[tokio::test]
async fn test_expenses_company_only() {
    let filter = ReportFilter::new(march()).include("company");
    let result = run(expenses_store(), ReportKind::Expenses, filter).await.unwrap();

    assert_eq!(result.rows.len(), 3);
    assert!(result.rows.iter().all(|r| r.get("client") == &Cell::text("-")));
    assert_eq!(result.rows[1].get("reference"), &Cell::text("-"));
    assert_eq!(result.total("amount"), Some(dec!(70000)));
}

#[tokio::test]
async fn test_expenses_by_category() {
    let filter = ReportFilter::new(march()).with_sub_type("by_category");
    let result = run(expenses_store(), ReportKind::Expenses, filter).await.unwrap();

    let categories: Vec<String> = result.rows.iter().map(|r| r.get("category").plain()).collect();
    assert_eq!(categories, vec!["Rent", "Timber", "Power"]);
    assert_eq!(result.rows[0].get("share"), &Cell::text("50.0%"));
    assert_eq!(result.total("entries"), Some(dec!(4)));
    assert_eq!(result.total("amount"), Some(dec!(100000)));
}

#[tokio::test]
async fn test_expenses_fail_whole() {
    let store = expenses_store().failing("expenses");
    let err = run(store, ReportKind::Expenses, ReportFilter::new(march()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ReportError::fetch("expenses", StoreError::transport("expenses", "injected failure"))
    );
}

// ============================================================================
// Clients, inventory, statements, cash book
// ============================================================================

#[tokio::test]
async fn test_client_without_activity_has_zero_balance() {
    let active = ClientId::new().to_string();
    let idle = ClientId::new().to_string();
    let store = MemoryStore::new()
        .with_table(
            "clients",
            vec![
                json!({"id": active, "name": "Amani Interiors", "phone": "0700000001"}),
                json!({"id": idle, "name": "Zawadi Designs"}),
            ],
        )
        .with_table(
            "sales_orders",
            vec![
                json!({"client_id": active, "grand_total": 80000, "date_created": "2026-03-02T08:00:00Z"}),
                json!({"client_id": active, "grand_total": "not a number", "date_created": "2026-03-03T08:00:00Z"}),
            ],
        )
        .with_table(
            "payments",
            vec![json!({"client_id": active, "amount": 30000, "date_created": "2026-03-05T08:00:00Z"})],
        )
        .with_table("expenses", vec![]);

    let result = run(store, ReportKind::Clients, ReportFilter::new(march())).await.unwrap();

    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0].get("balance").as_decimal(), Some(dec!(50000)));
    let idle_row = &result.rows[1];
    assert_eq!(idle_row.get("phone"), &Cell::text("-"));
    for key in ["orders", "payments", "expenses", "balance"] {
        assert_eq!(idle_row.get(key).as_decimal(), Some(Decimal::ZERO), "{key}");
    }
    assert_eq!(result.total("balance"), Some(dec!(50000)));
}

#[tokio::test]
async fn test_inventory_low_stock() {
    let store = MemoryStore::new()
        .with_table(
            "stock_items",
            vec![
                json!({"id": "s1", "name": "Edge tape", "unit": "roll", "quantity": 3, "unit_price": 450, "reorder_level": 5}),
                json!({"id": "s2", "name": "MDF 18mm", "category": "Board", "unit": "sheet", "quantity": 40, "unit_price": "4,200", "reorder_level": 10}),
            ],
        )
        .with_table(
            "stock_movements",
            vec![
                json!({"stock_item_id": "s2", "movement_type": "in", "quantity": 20, "date_created": "2026-03-02T08:00:00Z"}),
                json!({"stock_item_id": "s2", "movement_type": "out", "quantity": 6, "date_created": "2026-03-09T08:00:00Z"}),
                json!({"stock_item_id": "s1", "movement_type": "out", "quantity": 2, "date_created": "2026-01-09T08:00:00Z"}),
            ],
        );

    let valuation = run(store, ReportKind::Inventory, ReportFilter::new(march())).await.unwrap();
    assert_eq!(valuation.total("value"), Some(dec!(169350)));
    assert_eq!(valuation.total("received"), Some(dec!(20)));
    assert_eq!(valuation.total("issued"), Some(dec!(6)));
    assert_eq!(valuation.rows[0].get("status"), &Cell::text("Low"));
    assert_eq!(valuation.rows[0].get("category"), &Cell::text("-"));
}

#[tokio::test]
async fn test_financial_summary_from_store() {
    let store = MemoryStore::new()
        .with_table("sales_orders", vec![json!({"grand_total": 100000, "date_created": "2026-03-02T08:00:00Z"})])
        .with_table("cash_sales", vec![])
        .with_table("payments", vec![json!({"amount": 70000, "date_created": "2026-03-02T08:00:00Z"})])
        .with_table(
            "expenses",
            vec![
                json!({"amount": 40000, "client_id": "c1", "date_created": "2026-03-02T08:00:00Z"}),
                json!({"amount": 20000, "client_id": null, "date_created": "2026-03-02T08:00:00Z"}),
            ],
        );

    let result = run(store, ReportKind::FinancialSummary, ReportFilter::new(march()))
        .await
        .unwrap();
    let amount = |line: &str| {
        result
            .rows
            .iter()
            .find(|r| r.get("line") == &Cell::text(line))
            .and_then(|r| r.get("amount").as_decimal())
    };
    assert_eq!(amount("Gross profit"), Some(dec!(60000)));
    assert_eq!(amount("Operating profit"), Some(dec!(40000)));
    assert_eq!(amount("Outstanding receivables"), Some(dec!(30000)));
    assert_eq!(result.totals, None);
}

#[tokio::test]
async fn test_cash_book_opening_and_running_balance() {
    let store = MemoryStore::new().with_table(
        "account_transactions",
        vec![
            json!({"id": 1, "account_type": "bank", "transaction_type": "in", "amount": 10000, "transaction_date": "2026-02-10T08:00:00Z"}),
            json!({"id": 2, "account_type": "bank", "transaction_type": "out", "amount": 2500, "reference": "CHQ-7", "transaction_date": "2026-03-05T08:00:00Z"}),
            json!({"id": 3, "account_type": "bank", "transaction_type": "in", "amount": 4000, "transaction_date": "2026-03-02T08:00:00Z"}),
            json!({"id": 4, "account_type": "loan", "transaction_type": "in", "amount": 50000, "transaction_date": "2026-03-03T08:00:00Z"}),
        ],
    );

    let filter = ReportFilter::new(march()).with_sub_type("bank");
    let result = run(store, ReportKind::CashBook, filter).await.unwrap();

    let balances: Vec<Option<Decimal>> =
        result.rows.iter().map(|r| r.get("balance").as_decimal()).collect();
    assert_eq!(balances, vec![Some(dec!(10000)), Some(dec!(14000)), Some(dec!(11500))]);
    assert_eq!(result.rows[0].get("description"), &Cell::text("Opening balance"));
    assert_eq!(result.rows[0].get("debit"), &Cell::Null);
    assert_eq!(result.rows[2].get("reference"), &Cell::text("CHQ-7"));
    assert_eq!(result.total("debit"), Some(dec!(4000)));
    assert_eq!(result.total("credit"), Some(dec!(2500)));
}

// ============================================================================
// Empty results
// ============================================================================

fn empty_store() -> MemoryStore {
    [
        "quotations",
        "sales_orders",
        "invoices",
        "cash_sales",
        "expenses",
        "clients",
        "payments",
        "stock_items",
        "stock_movements",
        "account_transactions",
    ]
    .into_iter()
    .fold(MemoryStore::new(), |store, table| store.with_table(table, Vec::new()))
}

#[tokio::test]
async fn test_every_kind_empty_yields_zero_totals() {
    for kind in ReportKind::ALL {
        let result = run(empty_store(), kind, ReportFilter::new(march())).await.unwrap();
        assert!(result.rows.is_empty(), "{kind}");
        assert_eq!(result.warnings, vec![ReportWarning::NoData], "{kind}");
        if let Some(totals) = &result.totals {
            assert!(totals.values().all(Decimal::is_zero), "{kind}");
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

fn amount_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1_000_000i64..1_000_000i64).prop_map(|cents| json!(Decimal::new(cents, 2).to_string())),
        (0i64..100_000i64).prop_map(|n| json!(n)),
        Just(Value::Null),
        Just(json!("n/a")),
    ]
}

fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    let start = march().start().timestamp();
    let end = march().end().timestamp();
    (start..end).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every totalled column equals the sum of its cells.
    #[test]
    fn prop_totals_equal_column_sums(
        amounts in prop::collection::vec((amount_strategy(), timestamp_strategy()), 0..30),
        by_category in any::<bool>(),
    ) {
        let rows: Vec<Value> = amounts
            .iter()
            .enumerate()
            .map(|(i, (amount, at))| json!({
                "id": i,
                "category": if i % 3 == 0 { "Timber" } else { "Rent" },
                "amount": amount,
                "date_created": at.to_rfc3339(),
            }))
            .collect();
        let store = MemoryStore::new().with_table("expenses", rows).with_table("clients", vec![]);
        let mut filter = ReportFilter::new(march());
        if by_category {
            filter = filter.with_sub_type("by_category");
        }

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let result = runtime.block_on(run(store, ReportKind::Expenses, filter)).unwrap();
        let totals = result.totals.clone().unwrap();

        for column in result.columns.iter().filter(|c| c.total) {
            let sum: Decimal = result
                .rows
                .iter()
                .filter_map(|r| r.get(&column.key).as_decimal())
                .sum();
            prop_assert_eq!(totals[&column.key], sum);
        }
        for row in &result.rows {
            prop_assert_eq!(row.keys().count(), result.columns.len());
        }
    }

    /// Running balances are the prefix sums of `debit - credit` from the opening balance.
    #[test]
    fn prop_cash_book_prefix_sums(
        opening in -100_000i64..100_000i64,
        moves in prop::collection::vec((0i64..50_000i64, 0i64..50_000i64), 0..40),
    ) {
        let opening = Decimal::new(opening, 2);
        let entries: Vec<CashEntry> = moves
            .iter()
            .map(|(d, c)| CashEntry { at: None, debit: Decimal::new(*d, 2), credit: Decimal::new(*c, 2) })
            .collect();

        let balances = running_balances(opening, &entries);
        prop_assert_eq!(balances.len(), entries.len());

        let mut expected = opening;
        for (entry, balance) in entries.iter().zip(&balances) {
            expected += entry.debit - entry.credit;
            prop_assert_eq!(*balance, expected);
        }
    }
}
