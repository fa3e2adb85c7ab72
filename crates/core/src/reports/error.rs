//! Report error types.

use std::time::Duration;

use thiserror::Error;

use crate::period::PeriodError;
use crate::store::StoreError;

/// Errors that can occur during report generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// The date range could not be resolved.
    #[error("Invalid date range: {0}")]
    InvalidRange(#[from] PeriodError),

    /// Sub-type or include flag not supported by the report.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// No report is registered under this name.
    #[error("Unknown report type: {0}")]
    UnknownKind(String),

    /// A source query failed and the report cannot be produced without it.
    #[error("Failed to load {section}: {error}")]
    Fetch {
        /// Source label.
        section: String,
        /// Underlying store error.
        #[source]
        error: StoreError,
    },

    /// Every source of a degradable report failed.
    #[error("No section of the report could be loaded")]
    AllSectionsFailed,

    /// The fetch phase did not finish in time.
    #[error("Report data did not arrive within {after:?}")]
    Timeout {
        /// Configured bound.
        after: Duration,
    },

    /// The request was cancelled.
    #[error("Report generation was cancelled")]
    Cancelled,

    /// A newer request for the same panel replaced this one.
    #[error("Report request was superseded by a newer one")]
    Superseded,
}

impl ReportError {
    /// Create a fetch error.
    #[must_use]
    pub fn fetch(section: impl Into<String>, error: StoreError) -> Self {
        Self::Fetch {
            section: section.into(),
            error,
        }
    }

    /// Create an invalid filter error.
    #[must_use]
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }
}
