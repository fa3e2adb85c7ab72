//! The per-report contract consumed by the generic pipeline.

use std::collections::BTreeMap;

use chrono_tz::Tz;

use super::types::{ColumnSpec, ReportFilter, ReportKind, ReportRow};
use crate::store::{Query, Record};

/// What happens to a report when one of its source queries fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The report fails with an error naming the source.
    FailWhole,
    /// The failed source contributes nothing and the result carries a warning.
    DegradeSection,
}

/// One query issued while fetching a report.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuery {
    /// Label identifying the section; unique within a plan.
    pub label: &'static str,
    /// Query to run.
    pub query: Query,
}

impl SourceQuery {
    /// Pairs a label with a query.
    #[must_use]
    pub const fn new(label: &'static str, query: Query) -> Self {
        Self { label, query }
    }
}

/// Rows returned per source label. Sources that failed under
/// [`FailurePolicy::DegradeSection`] are absent.
#[derive(Debug, Clone, Default)]
pub struct FetchedSources {
    sources: BTreeMap<&'static str, Vec<Record>>,
}

impl FetchedSources {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the rows of one source.
    pub fn insert(&mut self, label: &'static str, rows: Vec<Record>) {
        self.sources.insert(label, rows);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, label: &'static str, rows: Vec<Record>) -> Self {
        self.insert(label, rows);
        self
    }

    /// Rows of a source; empty when the source was not fetched or failed.
    #[must_use]
    pub fn rows(&self, label: &str) -> &[Record] {
        self.sources.get(label).map_or(&[], Vec::as_slice)
    }

    /// True if no fetched source returned a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.values().all(Vec::is_empty)
    }
}

/// Settings available while turning records into rows.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext {
    /// Business timezone for dates shown in rows.
    pub tz: Tz,
}

/// Describes one report: its options, the queries it needs, and how fetched
/// records become rows.
///
/// The aggregator normalises the filter before calling [`plan`](Self::plan),
/// [`columns`](Self::columns) or [`assemble`](Self::assemble): `sub_type` is
/// set to a supported value (or the default) and an empty `include_flags` is
/// replaced by [`default_includes`](Self::default_includes).
pub trait ReportDescriptor: Send + Sync {
    /// Registry key.
    fn kind(&self) -> ReportKind;

    /// Display title.
    fn title(&self) -> &'static str;

    /// Supported sub-types.
    fn sub_types(&self) -> &'static [&'static str] {
        &[]
    }

    /// Sub-type used when the filter names none.
    fn default_sub_type(&self) -> Option<&'static str> {
        self.sub_types().first().copied()
    }

    /// Supported include flags.
    fn include_flags(&self) -> &'static [&'static str] {
        &[]
    }

    /// Flags assumed when the filter sets none.
    fn default_includes(&self) -> &'static [&'static str] {
        self.include_flags()
    }

    /// How source failures are handled.
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::FailWhole
    }

    /// Output columns for the filter.
    fn columns(&self, filter: &ReportFilter) -> Vec<ColumnSpec>;

    /// Queries to run concurrently.
    fn plan(&self, filter: &ReportFilter) -> Vec<SourceQuery>;

    /// Builds rows from the fetched records, in display order.
    fn assemble(
        &self,
        ctx: &AssemblyContext,
        filter: &ReportFilter,
        sources: &FetchedSources,
    ) -> Vec<ReportRow>;
}
