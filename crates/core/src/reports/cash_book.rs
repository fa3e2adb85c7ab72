//! Cash book with running balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::descriptor::{AssemblyContext, FetchedSources, ReportDescriptor, SourceQuery};
use super::fields;
use super::types::{ColumnSpec, ReportFilter, ReportKind, ReportRow};
use crate::store::{Query, Record};

const OPENING: &str = "opening";
const PERIOD: &str = "period";
const TABLE: &str = "account_transactions";

/// Account categories for debit/credit mapping.
///
/// - Asset (cash, bank, mobile money): money in is a debit
/// - Liability (credit card, loan): money in is a credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountNature {
    /// Money held.
    Asset,
    /// Money owed.
    Liability,
}

impl AccountNature {
    /// Determines the nature from an account type tag. Unknown tags are assets.
    #[must_use]
    pub fn from_account_type(account_type: &str) -> Self {
        match account_type.to_lowercase().as_str() {
            "credit_card" | "loan" => Self::Liability,
            _ => Self::Asset,
        }
    }

    /// Splits an amount into `(debit, credit)` by direction.
    #[must_use]
    pub fn split(self, direction: Direction, amount: Decimal) -> (Decimal, Decimal) {
        match (self, direction) {
            (Self::Asset, Direction::In) | (Self::Liability, Direction::Out) => {
                (amount, Decimal::ZERO)
            }
            (Self::Asset, Direction::Out) | (Self::Liability, Direction::In) => {
                (Decimal::ZERO, amount)
            }
        }
    }
}

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Money entering the account.
    In,
    /// Money leaving the account.
    Out,
}

impl Direction {
    fn parse(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            _ => None,
        }
    }
}

/// One posted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashEntry {
    /// When the transaction happened.
    pub at: Option<DateTime<Utc>>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

impl CashEntry {
    fn from_record(record: &Record) -> Self {
        let nature = AccountNature::from_account_type(
            &fields::text(record, "account_type").unwrap_or_default(),
        );
        let amount = fields::amount(record, "amount");
        let (debit, credit) = fields::text(record, "transaction_type")
            .as_deref()
            .and_then(Direction::parse)
            .map_or((Decimal::ZERO, Decimal::ZERO), |dir| nature.split(dir, amount));
        Self {
            at: fields::timestamp(record, "transaction_date"),
            debit,
            credit,
        }
    }

    /// `debit - credit`.
    #[must_use]
    pub fn change(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Balance after each entry, scanning left to right from `opening`.
///
/// `balances[n] = balances[n - 1] + debit[n] - credit[n]`, with
/// `balances[-1] = opening`.
#[must_use]
pub fn running_balances(opening: Decimal, entries: &[CashEntry]) -> Vec<Decimal> {
    entries
        .iter()
        .scan(opening, |balance, entry| {
            *balance += entry.change();
            Some(*balance)
        })
        .collect()
}

/// Transactions in the period with an opening balance and running balance.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashBookReport;

impl ReportDescriptor for CashBookReport {
    fn kind(&self) -> ReportKind {
        ReportKind::CashBook
    }

    fn title(&self) -> &'static str {
        "Cash Book"
    }

    fn sub_types(&self) -> &'static [&'static str] {
        &["cash", "bank", "mobile_money", "credit_card", "loan"]
    }

    /// All account types unless one is chosen.
    fn default_sub_type(&self) -> Option<&'static str> {
        None
    }

    fn columns(&self, _filter: &ReportFilter) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::date("date", "Date"),
            ColumnSpec::text("reference", "Reference"),
            ColumnSpec::text("description", "Description"),
            ColumnSpec::text("account", "Account"),
            ColumnSpec::money("debit", "Debit").totalled(),
            ColumnSpec::money("credit", "Credit").totalled(),
            ColumnSpec::money("balance", "Balance"),
        ]
    }

    fn plan(&self, filter: &ReportFilter) -> Vec<SourceQuery> {
        let base = || {
            Query::from(TABLE)
                .select([
                    "id",
                    "account_type",
                    "transaction_type",
                    "amount",
                    "description",
                    "reference",
                    "transaction_date",
                ])
                .eq_opt("account_type", filter.sub_type.clone())
        };
        vec![
            SourceQuery::new(OPENING, base().before("transaction_date", &filter.range)),
            SourceQuery::new(
                PERIOD,
                base()
                    .within("transaction_date", &filter.range)
                    .order_asc("transaction_date")
                    .order_asc("id"),
            ),
        ]
    }

    fn assemble(
        &self,
        ctx: &AssemblyContext,
        filter: &ReportFilter,
        sources: &FetchedSources,
    ) -> Vec<ReportRow> {
        if sources.is_empty() {
            return Vec::new();
        }

        let opening: Decimal = sources
            .rows(OPENING)
            .iter()
            .map(|r| CashEntry::from_record(r).change())
            .sum();

        let mut records: Vec<(&Record, CashEntry)> = sources
            .rows(PERIOD)
            .iter()
            .map(|r| (r, CashEntry::from_record(r)))
            .collect();
        records.sort_by_key(|(_, entry)| entry.at);

        let entries: Vec<CashEntry> = records.iter().map(|(_, e)| e.clone()).collect();
        let balances = running_balances(opening, &entries);

        let mut rows = Vec::with_capacity(records.len() + 1);
        rows.push(
            ReportRow::new()
                .with("date", filter.range.first_day(ctx.tz).format("%Y-%m-%d").to_string())
                .with("description", "Opening balance")
                .with("balance", opening),
        );
        for ((record, entry), balance) in records.iter().zip(balances) {
            rows.push(
                ReportRow::new()
                    .with("date", fields::local_date(record, "transaction_date", ctx.tz))
                    .with("reference", fields::text_or_missing(record, "reference"))
                    .with("description", fields::text(record, "description").unwrap_or_default())
                    .with("account", fields::text_or_missing(record, "account_type"))
                    .with("debit", entry.debit)
                    .with("credit", entry.credit)
                    .with("balance", balance),
            );
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("cash", Direction::In, (dec!(100), dec!(0)))]
    #[case("bank", Direction::Out, (dec!(0), dec!(100)))]
    #[case("mobile_money", Direction::In, (dec!(100), dec!(0)))]
    #[case("credit_card", Direction::In, (dec!(0), dec!(100)))]
    #[case("loan", Direction::Out, (dec!(100), dec!(0)))]
    fn test_split_by_nature(
        #[case] account: &str,
        #[case] direction: Direction,
        #[case] expected: (Decimal, Decimal),
    ) {
        assert_eq!(
            AccountNature::from_account_type(account).split(direction, dec!(100)),
            expected
        );
    }

    #[test]
    fn test_running_balance_hand_computed() {
        let entry = |debit, credit| CashEntry { at: None, debit, credit };
        let entries = vec![
            entry(dec!(1000), dec!(0)),
            entry(dec!(0), dec!(250)),
            entry(dec!(0), dec!(900)),
            entry(dec!(75.50), dec!(0)),
        ];
        assert_eq!(
            running_balances(dec!(500), &entries),
            vec![dec!(1500), dec!(1250), dec!(350), dec!(425.50)]
        );
    }

    #[test]
    fn test_order_matters() {
        let a = CashEntry { at: None, debit: dec!(0), credit: dec!(300) };
        let b = CashEntry { at: None, debit: dec!(500), credit: dec!(0) };
        let forward = running_balances(dec!(0), &[a.clone(), b.clone()]);
        let swapped = running_balances(dec!(0), &[b, a]);
        assert_ne!(forward[0], swapped[0]);
        assert_eq!(forward.last(), swapped.last());
    }
}
