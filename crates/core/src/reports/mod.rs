//! Report aggregation.
//!
//! Each report is a [`ReportDescriptor`]: the queries it needs, how records
//! become rows, and which columns are totalled. [`ReportAggregator`] runs any
//! descriptor through the same fetch, normalise and aggregate pipeline.
//!
//! - `sales` - Quotations, orders, invoices and cash sales
//! - `expenses` - Company and client expenses
//! - `inventory` - Stock valuation and movements
//! - `clients` - Per-client balances
//! - `financial` - Profit & loss and financial summary
//! - `cash_book` - Account transactions with running balance

pub mod aggregator;
pub mod cash_book;
pub mod clients;
pub mod descriptor;
pub mod error;
pub mod expenses;
pub mod fields;
pub mod financial;
pub mod inventory;
pub mod registry;
pub mod sales;
pub mod types;

#[cfg(test)]
mod tests;

pub use aggregator::{ReportAggregator, compute_totals};
pub use descriptor::{AssemblyContext, FailurePolicy, FetchedSources, ReportDescriptor, SourceQuery};
pub use error::ReportError;
pub use financial::FinancialSummary;
pub use registry::{CatalogueEntry, ReportRegistry};
pub use types::*;
