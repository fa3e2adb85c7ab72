//! In-process data store.
//!
//! Evaluates [`Query`] values over tables held in memory. Used by tests and
//! offline runs; supports per-table failure and latency injection.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use super::error::StoreError;
use super::query::{Filter, FilterOp, OrderBy, Projection, Query};
use super::{DataStore, Record};

/// Tables held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<Record>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a table. Non-object values are ignored.
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        let records = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.tables.insert(name.into(), records);
        self
    }

    /// Makes every query against `table` fail with a transport error.
    #[must_use]
    pub fn failing(mut self, table: impl Into<String>) -> Self {
        self.failing.insert(table.into());
        self
    }

    /// Delays every query against `table`.
    #[must_use]
    pub fn with_delay(mut self, table: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(table.into(), delay);
        self
    }

    /// Number of queries served so far, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::Relaxed)
    }

    fn evaluate(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let rows = self
            .tables
            .get(&query.table)
            .ok_or_else(|| StoreError::UnknownTable(query.table.clone()))?;

        let mut matched: Vec<&Record> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .collect();

        // Stable sort applied least-significant key first.
        for key in query.order.iter().rev() {
            matched.sort_by(|a, b| order_rows(a, b, key));
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }

        Ok(matched
            .into_iter()
            .map(|row| self.project(row, &query.columns))
            .collect())
    }

    fn project(&self, row: &Record, projection: &[Projection]) -> Record {
        let wildcard = projection.is_empty()
            || projection
                .iter()
                .any(|p| matches!(p, Projection::Column(c) if c == "*"));

        let mut out = if wildcard { row.clone() } else { Record::new() };

        for item in projection {
            match item {
                Projection::Column(column) if column != "*" => {
                    if let Some(value) = row.get(column) {
                        out.insert(column.clone(), value.clone());
                    }
                }
                Projection::Column(_) => {}
                Projection::Embed {
                    alias,
                    table,
                    foreign_key,
                    columns,
                } => {
                    let related = row
                        .get(foreign_key)
                        .filter(|fk| !fk.is_null())
                        .and_then(|fk| self.lookup(table, fk))
                        .map_or(Value::Null, |related| {
                            let cols: Vec<Projection> =
                                columns.iter().cloned().map(Projection::Column).collect();
                            Value::Object(self.project(related, &cols))
                        });
                    out.insert(alias.clone(), related);
                }
            }
        }
        out
    }

    fn lookup(&self, table: &str, id: &Value) -> Option<&Record> {
        self.tables
            .get(table)?
            .iter()
            .find(|r| r.get("id").is_some_and(|v| values_equal(v, id)))
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        self.fetches.fetch_add(1, AtomicOrdering::Relaxed);

        if let Some(delay) = self.delays.get(&query.table) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&query.table) {
            return Err(StoreError::transport(&query.table, "injected failure"));
        }
        self.evaluate(query)
    }
}

// ============================================================================
// Value comparison
// ============================================================================

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .ok()
                .or_else(|| Decimal::from_scientific(&text).ok())
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn as_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

/// Orders two values: numerically, then as instants, then lexically.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_decimal(a), as_decimal(b)) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (as_instant(a), as_instant(b)) {
        return Some(x.cmp(&y));
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || compare(a, b) == Some(Ordering::Equal)
}

fn matches(row: &Record, filter: &Filter) -> bool {
    let value = row.get(&filter.column).unwrap_or(&Value::Null);
    let cmp = |operand: &Value| {
        if value.is_null() {
            None
        } else {
            compare(value, operand)
        }
    };

    match &filter.op {
        FilterOp::Eq(operand) => !value.is_null() && values_equal(value, operand),
        FilterOp::Neq(operand) => !value.is_null() && !values_equal(value, operand),
        FilterOp::Gt(operand) => cmp(operand) == Some(Ordering::Greater),
        FilterOp::Gte(operand) => matches!(cmp(operand), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt(operand) => cmp(operand) == Some(Ordering::Less),
        FilterOp::Lte(operand) => matches!(cmp(operand), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::In(set) => !value.is_null() && set.iter().any(|v| values_equal(value, v)),
        FilterOp::IsNull => value.is_null(),
        FilterOp::NotNull => !value.is_null(),
    }
}

/// Nulls sort last ascending and first descending.
fn order_rows(a: &Record, b: &Record, key: &OrderBy) -> Ordering {
    let left = a.get(&key.column).unwrap_or(&Value::Null);
    let right = b.get(&key.column).unwrap_or(&Value::Null);
    let ordering = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
    };
    if key.ascending {
        ordering
    } else {
        ordering.reverse()
    }
}
