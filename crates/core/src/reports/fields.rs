//! Defensive accessors over store records.
//!
//! Source rows are loosely shaped: amounts may arrive as numbers, numeric
//! strings (sometimes with thousands separators) or be absent. Every accessor
//! here degrades instead of failing.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::store::Record;

/// Placeholder for unresolved references.
pub const MISSING: &str = "-";

/// Parses a loosely typed numeric value.
#[must_use]
pub fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .ok()
                .or_else(|| Decimal::from_scientific(&text).ok())
        }
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            Decimal::from_str(&cleaned).ok()
        }
        _ => None,
    }
}

/// Amount under `key`; missing or non-numeric values count as zero.
#[must_use]
pub fn amount(record: &Record, key: &str) -> Decimal {
    record.get(key).and_then(decimal).unwrap_or(Decimal::ZERO)
}

/// Non-empty text under `key`. Numbers are rendered as text.
#[must_use]
pub fn text(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Text under `key`, or [`MISSING`].
#[must_use]
pub fn text_or_missing(record: &Record, key: &str) -> String {
    text(record, key).unwrap_or_else(|| MISSING.to_owned())
}

/// Text field of an embedded relation, or [`MISSING`] when the relation did not resolve.
#[must_use]
pub fn embedded(record: &Record, alias: &str, key: &str) -> String {
    record
        .get(alias)
        .and_then(Value::as_object)
        .and_then(|related| text(related, key))
        .unwrap_or_else(|| MISSING.to_owned())
}

/// Identifier under `key` as a string, for grouping.
#[must_use]
pub fn id(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// RFC 3339 timestamp under `key`.
#[must_use]
pub fn timestamp(record: &Record, key: &str) -> Option<DateTime<Utc>> {
    let raw = record.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Local calendar date of the timestamp under `key`, or [`MISSING`].
#[must_use]
pub fn local_date(record: &Record, key: &str, tz: Tz) -> String {
    timestamp(record, key).map_or_else(
        || MISSING.to_owned(),
        |at| at.with_timezone(&tz).format("%Y-%m-%d").to_string(),
    )
}

/// `part` as a percentage of `whole` with one decimal place; `0.0%` when `whole` is zero.
#[must_use]
pub fn percent_of(part: Decimal, whole: Decimal) -> String {
    if whole.is_zero() {
        return "0.0%".to_owned();
    }
    let pct = (part * Decimal::ONE_HUNDRED / whole)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{pct:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => Record::new(),
        }
    }

    #[rstest]
    #[case(json!({"amount": 1500}), dec!(1500))]
    #[case(json!({"amount": "1,500.50"}), dec!(1500.50))]
    #[case(json!({"amount": 12.25}), dec!(12.25))]
    #[case(json!({"amount": null}), dec!(0))]
    #[case(json!({"amount": "n/a"}), dec!(0))]
    #[case(json!({"amount": true}), dec!(0))]
    #[case(json!({}), dec!(0))]
    fn test_amount_coerces(#[case] row: Value, #[case] expected: Decimal) {
        assert_eq!(amount(&record(row), "amount"), expected);
    }

    #[rstest]
    #[case(dec!(25), dec!(200), "12.5%")]
    #[case(dec!(1), dec!(3), "33.3%")]
    #[case(dec!(2), dec!(3), "66.7%")]
    #[case(dec!(200), dec!(200), "100.0%")]
    #[case(dec!(5), dec!(0), "0.0%")]
    #[case(dec!(0), dec!(0), "0.0%")]
    fn test_percent_of(#[case] part: Decimal, #[case] whole: Decimal, #[case] expected: &str) {
        assert_eq!(percent_of(part, whole), expected);
    }

    #[test]
    fn test_embedded_degrades_to_placeholder() {
        let row = record(json!({"client": null, "other": {"name": "  "}}));
        assert_eq!(embedded(&row, "client", "name"), MISSING);
        assert_eq!(embedded(&row, "other", "name"), MISSING);
        assert_eq!(embedded(&row, "absent", "name"), MISSING);

        let row = record(json!({"client": {"name": "Amani"}}));
        assert_eq!(embedded(&row, "client", "name"), "Amani");
    }

    #[test]
    fn test_local_date_uses_timezone() {
        let row = record(json!({"at": "2026-03-31T22:30:00Z"}));
        assert_eq!(local_date(&row, "at", chrono_tz::Africa::Nairobi), "2026-04-01");
        assert_eq!(local_date(&row, "missing", chrono_tz::Africa::Nairobi), MISSING);
    }
}
