//! Generic fetch, normalise, aggregate pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use futures::future::join_all;
use kabati_shared::types::ReportRunId;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::descriptor::{AssemblyContext, FailurePolicy, FetchedSources, ReportDescriptor};
use super::error::ReportError;
use super::types::{ColumnSpec, ReportFilter, ReportResult, ReportRow, ReportWarning};
use crate::store::DataStore;

/// Runs report descriptors against a data store.
#[derive(Clone)]
pub struct ReportAggregator {
    store: Arc<dyn DataStore>,
    tz: Tz,
}

impl std::fmt::Debug for ReportAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportAggregator").field("tz", &self.tz).finish_non_exhaustive()
    }
}

impl ReportAggregator {
    /// Creates an aggregator over `store`, formatting dates in `tz`.
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    /// Business timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Validates the filter against the descriptor and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidFilter` for an unsupported sub-type or flag.
    pub fn normalize_filter(
        descriptor: &dyn ReportDescriptor,
        filter: &ReportFilter,
    ) -> Result<ReportFilter, ReportError> {
        let mut resolved = filter.clone();

        match filter.sub_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(sub_type) => {
                let sub_type = sub_type.to_lowercase();
                if !descriptor.sub_types().contains(&sub_type.as_str()) {
                    return Err(ReportError::invalid_filter(format!(
                        "{} does not support sub-type '{sub_type}'",
                        descriptor.kind()
                    )));
                }
                resolved.sub_type = Some(sub_type);
            }
            None => resolved.sub_type = descriptor.default_sub_type().map(str::to_owned),
        }

        if let Some(flag) = filter
            .include_flags
            .iter()
            .find(|flag| !descriptor.include_flags().contains(&flag.as_str()))
        {
            return Err(ReportError::invalid_filter(format!(
                "{} does not support include flag '{flag}'",
                descriptor.kind()
            )));
        }
        if filter.include_flags.is_empty() {
            resolved.include_flags = descriptor
                .default_includes()
                .iter()
                .map(|flag| (*flag).to_owned())
                .collect();
        }

        Ok(resolved)
    }

    /// Produces a report: fetches every planned source concurrently, applies
    /// the descriptor's failure policy, assembles rows and computes totals.
    ///
    /// Dropping the returned future abandons any in-flight queries.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidFilter` for unsupported options and
    /// `ReportError::Fetch` when a source fails under [`FailurePolicy::FailWhole`].
    pub async fn aggregate(
        &self,
        descriptor: &dyn ReportDescriptor,
        filter: &ReportFilter,
    ) -> Result<ReportResult, ReportError> {
        let filter = Self::normalize_filter(descriptor, filter)?;
        let kind = descriptor.kind();
        let plan = descriptor.plan(&filter);

        debug!(report = %kind, sources = plan.len(), "fetching report sources");

        let outcomes = join_all(plan.iter().map(|source| async move {
            (source.label, self.store.fetch(&source.query).await)
        }))
        .await;

        let mut fetched = FetchedSources::new();
        let mut warnings = Vec::new();
        for (label, outcome) in outcomes {
            match outcome {
                Ok(rows) => fetched.insert(label, rows),
                Err(error) => match descriptor.failure_policy() {
                    FailurePolicy::FailWhole => {
                        warn!(report = %kind, source = label, error = %error, "report source failed");
                        return Err(ReportError::fetch(label, error));
                    }
                    FailurePolicy::DegradeSection => {
                        warn!(report = %kind, source = label, error = %error, "report section degraded");
                        warnings.push(ReportWarning::SectionUnavailable {
                            section: label.to_owned(),
                            message: error.to_string(),
                        });
                    }
                },
            }
        }
        if !plan.is_empty() && warnings.len() == plan.len() {
            return Err(ReportError::AllSectionsFailed);
        }

        let ctx = AssemblyContext { tz: self.tz };
        let columns = descriptor.columns(&filter);
        let rows: Vec<ReportRow> = descriptor
            .assemble(&ctx, &filter, &fetched)
            .into_iter()
            .map(|row| row.project(&columns))
            .collect();
        let totals = compute_totals(&columns, &rows);

        if rows.is_empty() {
            warnings.push(ReportWarning::NoData);
        }

        info!(report = %kind, rows = rows.len(), degraded = warnings.len(), "report generated");

        Ok(ReportResult {
            run_id: ReportRunId::new(),
            kind,
            title: descriptor.title().to_owned(),
            period: filter.range,
            period_label: filter.range.label(self.tz),
            columns,
            rows,
            totals,
            warnings,
            generated_at: Utc::now(),
        })
    }
}

/// Sums every totalled column over all rows. Non-numeric cells count as zero.
#[must_use]
pub fn compute_totals(
    columns: &[ColumnSpec],
    rows: &[ReportRow],
) -> Option<BTreeMap<String, Decimal>> {
    let totalled: Vec<&ColumnSpec> = columns.iter().filter(|c| c.total).collect();
    if totalled.is_empty() {
        return None;
    }
    Some(
        totalled
            .into_iter()
            .map(|column| {
                let sum: Decimal = rows
                    .iter()
                    .filter_map(|row| row.get(&column.key).as_decimal())
                    .sum();
                (column.key.clone(), sum)
            })
            .collect(),
    )
}
