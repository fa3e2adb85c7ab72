//! Report registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::cash_book::CashBookReport;
use super::clients::ClientsReport;
use super::descriptor::ReportDescriptor;
use super::error::ReportError;
use super::expenses::ExpensesReport;
use super::financial::{FinancialSummaryReport, ProfitLossReport};
use super::inventory::InventoryReport;
use super::sales::SalesReport;
use super::types::ReportKind;

/// Catalogue entry describing a report's options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogueEntry {
    /// Report kind.
    pub kind: ReportKind,
    /// Display title.
    pub title: &'static str,
    /// Supported sub-types.
    pub sub_types: &'static [&'static str],
    /// Default sub-type.
    pub default_sub_type: Option<&'static str>,
    /// Supported include flags.
    pub include_flags: &'static [&'static str],
}

/// Maps report kinds to their descriptors.
#[derive(Clone, Default)]
pub struct ReportRegistry {
    descriptors: BTreeMap<ReportKind, Arc<dyn ReportDescriptor>>,
}

impl std::fmt::Debug for ReportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.descriptors.keys()).finish()
    }
}

impl ReportRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in report.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .register(SalesReport)
            .register(ExpensesReport)
            .register(InventoryReport)
            .register(ClientsReport)
            .register(ProfitLossReport)
            .register(FinancialSummaryReport)
            .register(CashBookReport)
    }

    /// Adds (or replaces) a descriptor under its kind.
    #[must_use]
    pub fn register(mut self, descriptor: impl ReportDescriptor + 'static) -> Self {
        self.descriptors.insert(descriptor.kind(), Arc::new(descriptor));
        self
    }

    /// Looks up a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::UnknownKind` if nothing is registered for `kind`.
    pub fn get(&self, kind: ReportKind) -> Result<Arc<dyn ReportDescriptor>, ReportError> {
        self.descriptors
            .get(&kind)
            .cloned()
            .ok_or_else(|| ReportError::UnknownKind(kind.to_string()))
    }

    /// Looks up a descriptor by wire name.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::UnknownKind` for unrecognised names.
    pub fn by_name(&self, name: &str) -> Result<Arc<dyn ReportDescriptor>, ReportError> {
        let kind: ReportKind = name.parse().map_err(|_| ReportError::UnknownKind(name.to_owned()))?;
        self.get(kind)
    }

    /// Options of every registered report, in kind order.
    #[must_use]
    pub fn catalogue(&self) -> Vec<CatalogueEntry> {
        self.descriptors
            .values()
            .map(|d| CatalogueEntry {
                kind: d.kind(),
                title: d.title(),
                sub_types: d.sub_types(),
                default_sub_type: d.default_sub_type(),
                include_flags: d.include_flags(),
            })
            .collect()
    }
}
